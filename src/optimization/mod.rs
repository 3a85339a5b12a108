//! Settlement strategies over a balance map.

pub mod exact;
pub mod greedy;
pub mod settlement;
