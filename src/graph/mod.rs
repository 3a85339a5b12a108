//! Edge-set preprocessing and rendering.

pub mod star;
pub mod transfer_graph;
