//! # debt-simplifier
//!
//! Settle a group's shared expenses with as few transfers as possible.
//!
//! Debts arrive either as directed edges between named participants or as
//! transactions (a payer fronting an amount split evenly over payees).
//! They are reduced to one net balance per participant, and the balances
//! are then settled by an exact minimal-transfer search or by a greedy pass.
//!
//! ## Architecture
//!
//! - **core** - Participants, edges, transactions, balance aggregation
//! - **graph** - Wildcard (`*`) expansion and transfer rendering
//! - **optimization** - Exact and greedy settlement, the settlement engine
//! - **input** - Line-oriented text input
//! - **simulation** - Random expense generation

pub mod core;
pub mod graph;
pub mod input;
pub mod optimization;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::balance::{BalanceMap, Tolerance};
    pub use crate::core::edge::{Edge, RawEdge};
    pub use crate::core::error::SettleError;
    pub use crate::core::party::{PartyId, PartyRef};
    pub use crate::core::transaction::{ShareRounding, Transaction};
    pub use crate::graph::star::StarSplit;
    pub use crate::optimization::settlement::{
        Settlement, SettlementConfig, SettlementEngine, Strategy,
    };
}
