//! Foundational types: participants, edges, transactions, balances.

pub mod balance;
pub mod edge;
pub mod error;
pub mod party;
pub mod transaction;
