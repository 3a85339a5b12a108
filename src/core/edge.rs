use crate::core::party::{PartyId, PartyRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed debt: `to` is owed `amount` by `from`.
///
/// The amount may be negative until [`Edge::normalize`] runs, which
/// flips the direction instead. Settlement transfers are edges too:
/// `from` pays `to` a positive `amount`.
///
/// # Examples
///
/// ```
/// use debt_simplifier::core::edge::Edge;
/// use debt_simplifier::core::party::PartyId;
/// use rust_decimal_macros::dec;
///
/// let edge = Edge::new(PartyId::new("A"), PartyId::new("B"), dec!(-15)).normalized();
/// assert_eq!(edge.from().as_str(), "B");
/// assert_eq!(edge.amount(), dec!(15));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    from: PartyId,
    to: PartyId,
    amount: Decimal,
}

impl Edge {
    pub fn new(from: PartyId, to: PartyId, amount: Decimal) -> Self {
        Self { from, to, amount }
    }

    pub fn from(&self) -> &PartyId {
        &self.from
    }

    pub fn to(&self) -> &PartyId {
        &self.to
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Rewrite a negative-weight edge as the equivalent positive one.
    ///
    /// Idempotent: a second call finds a non-negative amount and does nothing.
    pub fn normalize(&mut self) {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            self.amount = -self.amount;
            std::mem::swap(&mut self.from, &mut self.to);
        }
    }

    /// Consuming form of [`Edge::normalize`].
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Amount rounded for display.
    pub fn display_amount(&self) -> Decimal {
        self.amount.round_dp(2).normalize()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.display_amount())
    }
}

/// An edge as written in the input, before star expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge {
    pub from: PartyRef,
    pub to: PartyRef,
    pub amount: Decimal,
}

impl RawEdge {
    pub fn new(from: impl Into<PartyRef>, to: impl Into<PartyRef>, amount: Decimal) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    pub fn has_wildcard(&self) -> bool {
        self.from.is_wildcard() || self.to.is_wildcard()
    }

    /// The concrete edge, if neither endpoint is the wildcard.
    pub fn to_concrete(&self) -> Option<Edge> {
        match (&self.from, &self.to) {
            (PartyRef::Named(from), PartyRef::Named(to)) => {
                Some(Edge::new(from.clone(), to.clone(), self.amount))
            }
            _ => None,
        }
    }
}

impl From<Edge> for RawEdge {
    fn from(edge: Edge) -> Self {
        Self {
            from: PartyRef::Named(edge.from),
            to: PartyRef::Named(edge.to),
            amount: edge.amount,
        }
    }
}
