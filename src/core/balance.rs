use crate::core::edge::Edge;
use crate::core::error::SettleError;
use crate::core::party::PartyId;
use crate::core::transaction::{ShareRounding, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Magnitude below which an amount counts as zero.
///
/// Exact shares such as `10 / 3` leave residues in the last decimal place;
/// every zero test in the crate goes through one tolerance so those
/// residues never turn into transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Tolerance(Decimal);

impl Tolerance {
    /// 1e-10.
    pub const DEFAULT: Tolerance = Tolerance(Decimal::from_parts(1, 0, 0, false, 10));

    pub fn new(value: Decimal) -> Self {
        Self(value.abs())
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self, amount: Decimal) -> bool {
        amount.abs() <= self.0
    }

    /// True when both amounts are non-zero and of opposite sign.
    pub fn opposite_signs(self, a: Decimal, b: Decimal) -> bool {
        !self.is_zero(a) && !self.is_zero(b) && a.is_sign_negative() != b.is_sign_negative()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Decimal> for Tolerance {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<Tolerance> for Decimal {
    fn from(tolerance: Tolerance) -> Self {
        tolerance.0
    }
}

/// Net position of every participant.
///
/// A positive balance means the participant is owed money (net creditor),
/// a negative balance means they owe (net debtor). Entries iterate in
/// participant order, which keeps every strategy deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceMap {
    positions: BTreeMap<PartyId, Decimal>,
}

impl BalanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn shift(&mut self, party: &PartyId, delta: Decimal) -> Result<(), SettleError> {
        let position = self.positions.entry(party.clone()).or_insert(Decimal::ZERO);
        *position = position
            .checked_add(delta)
            .ok_or_else(|| SettleError::AmountOverflow { party: party.clone() })?;
        Ok(())
    }

    /// Apply a debt: `to` gains the amount, `from` loses it.
    pub fn apply_edge(&mut self, edge: &Edge) -> Result<(), SettleError> {
        self.shift(edge.to(), edge.amount())?;
        self.shift(edge.from(), -edge.amount())
    }

    /// Apply a settling payment: `from` pays `to`, moving both towards zero.
    pub fn apply_transfer(&mut self, transfer: &Edge) -> Result<(), SettleError> {
        self.shift(transfer.from(), transfer.amount())?;
        self.shift(transfer.to(), -transfer.amount())
    }

    /// Raw aggregation, zero entries included.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Result<Self, SettleError> {
        let mut map = Self::new();
        for edge in edges {
            map.apply_edge(edge)?;
        }
        Ok(map)
    }

    /// Expand each transaction into `(payer, payee, share)` edges and
    /// aggregate them.
    pub fn from_transactions(
        transactions: &[Transaction],
        rounding: ShareRounding,
    ) -> Result<Self, SettleError> {
        let mut map = Self::new();
        for tx in transactions {
            for edge in tx.to_edges(rounding) {
                map.apply_edge(&edge)?;
            }
        }
        Ok(map)
    }

    pub fn position(&self, party: &PartyId) -> Decimal {
        self.positions.get(party).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn positions(&self) -> &BTreeMap<PartyId, Decimal> {
        &self.positions
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartyId, Decimal)> {
        self.positions.iter().map(|(p, &v)| (p, v))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sum of all positions; zero for consistent input.
    pub fn total(&self) -> Decimal {
        self.positions.values().sum()
    }

    pub fn is_balanced(&self, tolerance: Tolerance) -> bool {
        self.verify_balanced(tolerance).is_ok()
    }

    /// Check that the money owed, and the money due, each fit in a
    /// `Decimal`. Every partial sum the strategies form is bounded by one
    /// of the two, so settling cannot overflow afterwards.
    pub fn verify_headroom(&self) -> Result<(), SettleError> {
        let mut owed = Decimal::ZERO;
        let mut due = Decimal::ZERO;
        for (party, &amount) in &self.positions {
            let side = if amount.is_sign_negative() { &mut due } else { &mut owed };
            *side = side
                .checked_add(amount)
                .ok_or_else(|| SettleError::AmountOverflow { party: party.clone() })?;
        }
        Ok(())
    }

    /// Check the zero-sum invariant.
    pub fn verify_balanced(&self, tolerance: Tolerance) -> Result<(), SettleError> {
        self.verify_headroom()?;
        let residual = self.total();
        if tolerance.is_zero(residual) {
            Ok(())
        } else {
            Err(SettleError::Unbalanced {
                residual,
                tolerance: tolerance.value(),
            })
        }
    }

    /// Drop settled participants.
    pub fn without_zeros(&self, tolerance: Tolerance) -> Self {
        self.positions
            .iter()
            .filter(|(_, v)| !tolerance.is_zero(**v))
            .map(|(p, &v)| (p.clone(), v))
            .collect()
    }

    /// True once every participant is within tolerance of zero.
    pub fn is_settled(&self, tolerance: Tolerance) -> bool {
        self.positions.values().all(|v| tolerance.is_zero(*v))
    }

    /// Non-zero `(balance, participant)` pairs, ascending by balance and
    /// then by participant.
    pub fn sorted(&self, tolerance: Tolerance) -> Vec<(Decimal, PartyId)> {
        let mut sorted: Vec<(Decimal, PartyId)> = self
            .positions
            .iter()
            .filter(|(_, v)| !tolerance.is_zero(**v))
            .map(|(p, &v)| (v, p.clone()))
            .collect();
        sorted.sort();
        sorted
    }

    pub fn creditor_count(&self, tolerance: Tolerance) -> usize {
        self.positions
            .values()
            .filter(|v| !tolerance.is_zero(**v) && v.is_sign_positive())
            .count()
    }

    pub fn debtor_count(&self, tolerance: Tolerance) -> usize {
        self.positions
            .values()
            .filter(|v| !tolerance.is_zero(**v) && v.is_sign_negative())
            .count()
    }

    /// No settlement can use fewer transfers than this: every unsettled
    /// participant takes part in at least one transfer and each transfer
    /// touches exactly one debtor and one creditor.
    pub fn transfer_lower_bound(&self, tolerance: Tolerance) -> usize {
        self.creditor_count(tolerance).max(self.debtor_count(tolerance))
    }

    /// Total that has to change hands: the sum of positive positions.
    pub fn total_owed(&self) -> Decimal {
        self.positions
            .values()
            .filter(|v| v.is_sign_positive())
            .sum()
    }
}

impl FromIterator<(PartyId, Decimal)> for BalanceMap {
    fn from_iter<T: IntoIterator<Item = (PartyId, Decimal)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (party, amount) in iter {
            *map.positions.entry(party).or_insert(Decimal::ZERO) += amount;
        }
        map
    }
}

impl fmt::Display for BalanceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (party, amount) in &self.positions {
            writeln!(f, "  {:<12} {:>12}", party, amount.round_dp(2).normalize())?;
        }
        Ok(())
    }
}

/// Aggregate finalized edges into non-zero balances, checking that they
/// net to zero.
pub fn aggregate_edges(edges: &[Edge], tolerance: Tolerance) -> Result<BalanceMap, SettleError> {
    let raw = BalanceMap::from_edges(edges)?;
    raw.verify_balanced(tolerance)?;
    Ok(raw.without_zeros(tolerance))
}

/// Aggregate transactions into non-zero balances, checking that they net
/// to zero.
pub fn aggregate_transactions(
    transactions: &[Transaction],
    rounding: ShareRounding,
    tolerance: Tolerance,
) -> Result<BalanceMap, SettleError> {
    let raw = BalanceMap::from_transactions(transactions, rounding)?;
    raw.verify_balanced(tolerance)?;
    Ok(raw.without_zeros(tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn party(id: &str) -> PartyId {
        PartyId::new(id)
    }

    fn edge(from: &str, to: &str, amount: Decimal) -> Edge {
        Edge::new(party(from), party(to), amount)
    }

    #[test]
    fn test_default_tolerance() {
        assert_eq!(Tolerance::DEFAULT.value(), dec!(0.0000000001));
        assert!(Tolerance::DEFAULT.is_zero(dec!(0.00000000001)));
        assert!(!Tolerance::DEFAULT.is_zero(dec!(0.001)));
    }

    #[test]
    fn test_edge_aggregation() {
        let map =
            BalanceMap::from_edges(&[edge("A", "B", dec!(100)), edge("B", "C", dec!(60))]).unwrap();
        assert_eq!(map.position(&party("A")), dec!(-100));
        assert_eq!(map.position(&party("B")), dec!(40));
        assert_eq!(map.position(&party("C")), dec!(60));
        assert!(map.is_balanced(Tolerance::DEFAULT));
    }

    #[test]
    fn test_cycle_cancels_and_is_dropped() {
        let edges = [
            edge("A", "B", dec!(100)),
            edge("B", "C", dec!(100)),
            edge("C", "A", dec!(100)),
        ];
        let map = aggregate_edges(&edges, Tolerance::DEFAULT).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_transactions_example() {
        let txs = vec![
            Transaction::new(party("X"), dec!(15), vec![party("X"), party("Y")]).unwrap(),
            Transaction::new(party("Y"), dec!(62), vec![party("X"), party("Y")]).unwrap(),
        ];
        let map = aggregate_transactions(&txs, ShareRounding::Exact, Tolerance::DEFAULT).unwrap();
        assert_eq!(map.position(&party("X")), dec!(23.5));
        assert_eq!(map.position(&party("Y")), dec!(-23.5));
    }

    #[test]
    fn test_unbalanced_is_reported() {
        let map: BalanceMap = [(party("A"), dec!(10)), (party("B"), dec!(-9))]
            .into_iter()
            .collect();
        let err = map.verify_balanced(Tolerance::DEFAULT).unwrap_err();
        assert_eq!(
            err,
            SettleError::Unbalanced {
                residual: dec!(1),
                tolerance: Tolerance::DEFAULT.value(),
            }
        );
    }

    #[test]
    fn test_thirds_stay_within_tolerance() {
        let third = dec!(10) / dec!(3);
        let edges = [
            edge("A", "B", third),
            edge("A", "C", third),
            edge("A", "D", third),
            edge("B", "A", dec!(10)),
        ];
        let map = aggregate_edges(&edges, Tolerance::DEFAULT).unwrap();
        assert!(map.position(&party("A")).abs() <= Tolerance::DEFAULT.value());
        assert!(!map.positions().contains_key(&party("A")));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_sorted_orders_by_balance_then_party() {
        let map: BalanceMap = [
            (party("D"), dec!(-10)),
            (party("A"), dec!(10)),
            (party("C"), dec!(-5)),
            (party("B"), dec!(5)),
            (party("E"), Decimal::ZERO),
        ]
        .into_iter()
        .collect();
        let sorted: Vec<_> = map
            .sorted(Tolerance::DEFAULT)
            .into_iter()
            .map(|(_, p)| p.as_str().to_string())
            .collect();
        assert_eq!(sorted, vec!["D", "C", "B", "A"]);
    }

    #[test]
    fn test_lower_bound_and_counts() {
        let map: BalanceMap = [
            (party("A"), dec!(30)),
            (party("B"), dec!(-10)),
            (party("C"), dec!(-10)),
            (party("D"), dec!(-10)),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.creditor_count(Tolerance::DEFAULT), 1);
        assert_eq!(map.debtor_count(Tolerance::DEFAULT), 3);
        assert_eq!(map.transfer_lower_bound(Tolerance::DEFAULT), 3);
        assert_eq!(map.total_owed(), dec!(30));
    }

    #[test]
    fn test_apply_transfer_settles() {
        let mut map: BalanceMap = [(party("A"), dec!(-15)), (party("B"), dec!(15))]
            .into_iter()
            .collect();
        map.apply_transfer(&edge("A", "B", dec!(15))).unwrap();
        assert!(map.is_settled(Tolerance::DEFAULT));
    }

    #[test]
    fn test_negative_tolerance_is_read_as_magnitude() {
        let tolerance: Tolerance = serde_json::from_str(r#""-0.01""#).unwrap();
        assert_eq!(tolerance.value(), dec!(0.01));
        assert!(tolerance.is_zero(Decimal::ZERO));
        assert_eq!(serde_json::to_string(&tolerance).unwrap(), r#""0.01""#);
    }

    #[test]
    fn test_overflowing_edges_are_reported() {
        let edges = [edge("A", "B", Decimal::MAX), edge("C", "B", Decimal::MAX)];
        assert_eq!(
            aggregate_edges(&edges, Tolerance::DEFAULT).unwrap_err(),
            SettleError::AmountOverflow { party: party("B") }
        );
    }

    #[test]
    fn test_headroom_covers_total_owed() {
        // each position fits, but what A and B are owed together does not
        let map: BalanceMap = [
            (party("A"), Decimal::MAX),
            (party("B"), Decimal::MAX),
            (party("C"), -Decimal::MAX),
            (party("D"), -Decimal::MAX),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            map.verify_balanced(Tolerance::DEFAULT).unwrap_err(),
            SettleError::AmountOverflow { party: party("B") }
        );
    }
}
