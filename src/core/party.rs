use serde::{Deserialize, Serialize};
use std::fmt;

/// Text spelling of the wildcard participant in line input.
pub const WILDCARD: &str = "*";

/// Identifier of a participant sharing expenses.
///
/// Participants carry no data beyond their identity; two ids are the
/// same participant exactly when their strings are equal.
///
/// # Examples
///
/// ```
/// use debt_simplifier::core::party::PartyId;
///
/// let alice = PartyId::new("alice");
/// let bob = PartyId::new("bob");
/// assert_ne!(alice, bob);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this party ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PartyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An endpoint of a raw, not yet expanded edge.
///
/// `Wildcard` stands for "every known participant" and only exists until
/// star expansion replaces it with concrete [`PartyId`]s. Balances and
/// settlements never contain it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartyRef {
    Named(PartyId),
    Wildcard,
}

impl PartyRef {
    /// Interpret a token from line input; `*` becomes the wildcard.
    pub fn parse(token: &str) -> Self {
        if token == WILDCARD {
            Self::Wildcard
        } else {
            Self::Named(PartyId::new(token))
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    pub fn as_named(&self) -> Option<&PartyId> {
        match self {
            Self::Named(id) => Some(id),
            Self::Wildcard => None,
        }
    }
}

impl From<PartyId> for PartyRef {
    fn from(id: PartyId) -> Self {
        Self::Named(id)
    }
}

impl From<&str> for PartyRef {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl fmt::Display for PartyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(id) => write!(f, "{}", id),
            Self::Wildcard => f.write_str(WILDCARD),
        }
    }
}
