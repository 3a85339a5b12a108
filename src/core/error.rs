use crate::core::party::PartyId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the settlement core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettleError {
    #[error("transaction paid by {payer} has no payees")]
    EmptyPayees { payer: PartyId },

    /// Aggregated balances do not sum to zero. Points at a bug in how the
    /// input was built, never at a legitimate expense set.
    #[error("balances do not net to zero: residual {residual} exceeds tolerance {tolerance}")]
    Unbalanced {
        residual: Decimal,
        tolerance: Decimal,
    },

    /// Accumulating `party`'s position left the representable range.
    #[error("balance of {party} overflows the supported amount range")]
    AmountOverflow { party: PartyId },

    #[error("exact search exceeded the limit of {limit} branches")]
    BranchLimitExceeded { limit: u64 },

    #[error("transfers leave {party} with an unsettled balance of {remaining}")]
    Unsettled { party: PartyId, remaining: Decimal },
}
