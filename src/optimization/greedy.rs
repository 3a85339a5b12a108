use crate::core::balance::{BalanceMap, Tolerance};
use crate::core::edge::Edge;
use crate::core::party::PartyId;
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Settle `balances` in a single pass.
///
/// Participants are taken in ascending balance order, so debtors come
/// first. Each one is settled completely against the first participant,
/// in map order, whose opposite balance can absorb the whole amount. When
/// nobody can, the next unsettled participant in sorted order takes it
/// on and settles it later with a transfer of its own.
///
/// Every transfer drives the current participant to exactly zero, so the
/// loop terminates after at most `n - 1` transfers. The result is valid
/// but not necessarily minimal.
///
/// `balances` should have passed [`BalanceMap::verify_balanced`]; the
/// running totals then stay in range.
pub fn greedy_settle(balances: &BalanceMap, tolerance: Tolerance) -> Vec<Edge> {
    let sorted = balances.sorted(tolerance);
    let mut weights: BTreeMap<PartyId, Decimal> = balances
        .iter()
        .filter(|(_, v)| !tolerance.is_zero(*v))
        .map(|(p, v)| (p.clone(), v))
        .collect();
    let mut transfers = Vec::new();

    for (i, (_, current)) in sorted.iter().enumerate() {
        let weight = weights.get(current).copied().unwrap_or(Decimal::ZERO);
        if tolerance.is_zero(weight) {
            continue;
        }

        let target = find_absorber(&weights, weight, tolerance).or_else(|| {
            sorted[i + 1..]
                .iter()
                .map(|(_, p)| p)
                .find(|p| weights.get(*p).is_some_and(|w| !tolerance.is_zero(*w)))
                .cloned()
        });
        let Some(target) = target else {
            debug!("{} left with residual {}", current, weight);
            continue;
        };

        let transfer = if weight.is_sign_negative() {
            Edge::new(current.clone(), target.clone(), weight.abs())
        } else {
            Edge::new(target.clone(), current.clone(), weight)
        };
        transfers.push(transfer);

        if let Some(w) = weights.get_mut(&target) {
            *w += weight;
        }
        weights.insert(current.clone(), Decimal::ZERO);
    }

    debug!(
        "greedy settlement of {} balances used {} transfers",
        sorted.len(),
        transfers.len()
    );
    transfers
}

/// First participant whose opposite balance covers `weight` in full.
fn find_absorber(
    weights: &BTreeMap<PartyId, Decimal>,
    weight: Decimal,
    tolerance: Tolerance,
) -> Option<PartyId> {
    let needed = weight.abs();
    weights
        .iter()
        .find(|(_, w)| tolerance.opposite_signs(weight, **w) && w.abs() >= needed)
        .map(|(p, _)| p.clone())
}
