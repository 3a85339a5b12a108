//! Line-oriented text input.

pub mod parser;
