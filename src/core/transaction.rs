use crate::core::edge::Edge;
use crate::core::error::SettleError;
use crate::core::party::PartyId;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a transaction's per-payee share is rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareRounding {
    /// Keep the full decimal quotient.
    #[default]
    Exact,
    /// Round to the nearest whole unit, halves away from zero.
    NearestUnit,
}

impl ShareRounding {
    pub fn apply(self, share: Decimal) -> Decimal {
        match self {
            Self::Exact => share,
            Self::NearestUnit => {
                share.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
        }
    }
}

/// A shared expense: `payer` fronted `amount`, split evenly over `payees`.
///
/// The payer may appear among the payees, in which case their own share
/// nets out during aggregation.
///
/// # Examples
///
/// ```
/// use debt_simplifier::core::party::PartyId;
/// use debt_simplifier::core::transaction::{ShareRounding, Transaction};
/// use rust_decimal_macros::dec;
///
/// let dinner = Transaction::new(
///     PartyId::new("X"),
///     dec!(15),
///     vec![PartyId::new("X"), PartyId::new("Y")],
/// ).unwrap();
/// assert_eq!(dinner.share(ShareRounding::Exact), dec!(7.5));
/// assert_eq!(dinner.share(ShareRounding::NearestUnit), dec!(8));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    payer: PartyId,
    amount: Decimal,
    payees: Vec<PartyId>,
}

impl Transaction {
    /// Create a transaction. At least one payee is required.
    pub fn new(payer: PartyId, amount: Decimal, payees: Vec<PartyId>) -> Result<Self, SettleError> {
        if payees.is_empty() {
            return Err(SettleError::EmptyPayees { payer });
        }
        Ok(Self {
            payer,
            amount,
            payees,
        })
    }

    pub fn payer(&self) -> &PartyId {
        &self.payer
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn payees(&self) -> &[PartyId] {
        &self.payees
    }

    /// Per-payee share, rounded once.
    pub fn share(&self, rounding: ShareRounding) -> Decimal {
        rounding.apply(self.amount / Decimal::from(self.payees.len()))
    }

    /// What the rounded shares fail to cover: `amount - share * |payees|`.
    pub fn rounding_residual(&self, rounding: ShareRounding) -> Decimal {
        self.amount - self.share(rounding) * Decimal::from(self.payees.len())
    }

    /// One `(payer, payee, share)` edge per payee, in payee order.
    pub fn to_edges(&self, rounding: ShareRounding) -> Vec<Edge> {
        let share = self.share(rounding);
        self.payees
            .iter()
            .map(|payee| Edge::new(self.payer.clone(), payee.clone(), share))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn party(id: &str) -> PartyId {
        PartyId::new(id)
    }

    #[test]
    fn test_empty_payees_rejected() {
        let err = Transaction::new(party("X"), dec!(10), vec![]).unwrap_err();
        assert_eq!(err, SettleError::EmptyPayees { payer: party("X") });
    }

    #[test]
    fn test_exact_share() {
        let tx = Transaction::new(party("X"), dec!(62), vec![party("X"), party("Y")]).unwrap();
        assert_eq!(tx.share(ShareRounding::Exact), dec!(31));
        assert_eq!(tx.rounding_residual(ShareRounding::Exact), Decimal::ZERO);
    }

    #[test]
    fn test_nearest_unit_rounds_half_away_from_zero() {
        let tx = Transaction::new(party("X"), dec!(15), vec![party("X"), party("Y")]).unwrap();
        assert_eq!(tx.share(ShareRounding::NearestUnit), dec!(8));
        assert_eq!(tx.rounding_residual(ShareRounding::NearestUnit), dec!(-1));

        let refund = Transaction::new(party("X"), dec!(-15), vec![party("X"), party("Y")]).unwrap();
        assert_eq!(refund.share(ShareRounding::NearestUnit), dec!(-8));
    }

    #[test]
    fn test_residual_is_bounded() {
        let tx = Transaction::new(
            party("A"),
            dec!(100),
            vec![party("A"), party("B"), party("C")],
        )
        .unwrap();
        let residual = tx.rounding_residual(ShareRounding::NearestUnit);
        assert_eq!(residual, dec!(1));
        assert!(residual.abs() <= Decimal::from(tx.payees().len()) / dec!(2));
    }

    #[test]
    fn test_to_edges() {
        let tx = Transaction::new(party("X"), dec!(15), vec![party("X"), party("Y")]).unwrap();
        let edges = tx.to_edges(ShareRounding::Exact);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1], Edge::new(party("X"), party("Y"), dec!(7.5)));
    }
}
