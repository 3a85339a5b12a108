use crate::core::edge::{Edge, RawEdge};
use crate::core::party::{PartyId, PartyRef};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Divisor used when a wildcard edge is split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarSplit {
    /// Divide by every known participant, the named endpoint included.
    /// The named endpoint's own share is dropped, as it would net out.
    #[default]
    AllParticipants,
    /// Divide by the participants that actually receive an edge.
    Counterparties,
}

/// Result of resolving wildcard edges.
#[derive(Debug, Clone, PartialEq)]
pub struct StarExpansion {
    /// Concrete edges, input order preserved.
    pub edges: Vec<Edge>,
    /// Every concrete participant discovered, sorted.
    pub participants: Vec<PartyId>,
    /// Wildcard edges that resolved to no edge at all.
    pub empty_wildcards: usize,
}

impl StarExpansion {
    /// Fewer than two participants: nothing meaningful can be split.
    pub fn is_degenerate(&self) -> bool {
        self.participants.len() < 2
    }
}

/// Collect the concrete participant universe: declared participants plus
/// every named edge endpoint.
pub fn discover_participants(edges: &[RawEdge], declared: &[PartyId]) -> Vec<PartyId> {
    let mut parties: BTreeSet<PartyId> = declared.iter().cloned().collect();
    for edge in edges {
        for endpoint in [&edge.from, &edge.to] {
            if let PartyRef::Named(id) = endpoint {
                parties.insert(id.clone());
            }
        }
    }
    parties.into_iter().collect()
}

/// Replace wildcard endpoints with one edge per concrete participant.
///
/// `* -> B: w` becomes `P -> B: w / n` for every participant `P` other
/// than `B` (and symmetrically for `A -> *`), where `n` depends on
/// `split`. Edges without a wildcard pass through unchanged. An edge with
/// the wildcard on both ends nets to zero and is dropped.
pub fn expand_star_edges(edges: &[RawEdge], declared: &[PartyId], split: StarSplit) -> StarExpansion {
    let participants = discover_participants(edges, declared);
    debug!(
        "found {} unique participants: {:?}",
        participants.len(),
        participants
    );

    let mut expanded = Vec::with_capacity(edges.len());
    let mut empty_wildcards = 0;

    for edge in edges {
        match (&edge.from, &edge.to) {
            (PartyRef::Named(from), PartyRef::Named(to)) => {
                expanded.push(Edge::new(from.clone(), to.clone(), edge.amount));
            }
            (PartyRef::Wildcard, PartyRef::Named(to)) => {
                let before = expanded.len();
                expanded.extend(
                    split_among(&participants, to, edge.amount, split)
                        .map(|(party, share)| Edge::new(party, to.clone(), share)),
                );
                if expanded.len() == before {
                    empty_wildcards += 1;
                }
            }
            (PartyRef::Named(from), PartyRef::Wildcard) => {
                let before = expanded.len();
                expanded.extend(
                    split_among(&participants, from, edge.amount, split)
                        .map(|(party, share)| Edge::new(from.clone(), party, share)),
                );
                if expanded.len() == before {
                    empty_wildcards += 1;
                }
            }
            (PartyRef::Wildcard, PartyRef::Wildcard) => {
                warn!("dropping wildcard-to-wildcard edge of {}", edge.amount);
                empty_wildcards += 1;
            }
        }
    }

    if empty_wildcards > 0 {
        warn!(
            "{} wildcard edge(s) resolved to no participants ({} known)",
            empty_wildcards,
            participants.len()
        );
    }

    StarExpansion {
        edges: expanded,
        participants,
        empty_wildcards,
    }
}

fn split_among<'a>(
    participants: &'a [PartyId],
    named: &'a PartyId,
    amount: Decimal,
    split: StarSplit,
) -> impl Iterator<Item = (PartyId, Decimal)> + 'a {
    let others = participants.iter().filter(|p| *p != named).count();
    let divisor = match split {
        StarSplit::AllParticipants => participants.len(),
        StarSplit::Counterparties => others,
    };
    let share = if divisor == 0 {
        Decimal::ZERO
    } else {
        amount / Decimal::from(divisor)
    };
    participants
        .iter()
        .filter(move |p| *p != named)
        .map(move |p| (p.clone(), share))
}
