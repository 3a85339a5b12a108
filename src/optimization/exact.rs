use crate::core::balance::{BalanceMap, Tolerance};
use crate::core::edge::Edge;
use crate::core::error::SettleError;
use crate::core::party::PartyId;
use log::debug;
use rust_decimal::Decimal;

/// Minimal-transfer settlement found by [`ExactSolver`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExactSolution {
    pub transfers: Vec<Edge>,
    /// Number of tentative transfers tried during the search.
    pub branches: u64,
}

impl ExactSolution {
    pub fn count(&self) -> usize {
        self.transfers.len()
    }
}

/// Backtracking search for the settlement with the fewest transfers.
///
/// The problem is NP-hard; the search is factorial in the worst case.
/// Sign pruning keeps small groups fast, and `max_branches` lets callers
/// abort early and fall back to [`crate::optimization::greedy`].
///
/// # Examples
///
/// ```
/// use debt_simplifier::core::balance::{BalanceMap, Tolerance};
/// use debt_simplifier::core::party::PartyId;
/// use debt_simplifier::optimization::exact::ExactSolver;
/// use rust_decimal_macros::dec;
///
/// let balances: BalanceMap = [
///     (PartyId::new("A"), dec!(-15)),
///     (PartyId::new("B"), dec!(15)),
/// ].into_iter().collect();
///
/// let solution = ExactSolver::new(Tolerance::DEFAULT).solve(&balances).unwrap();
/// assert_eq!(solution.count(), 1);
/// assert_eq!(solution.transfers[0].to().as_str(), "B");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExactSolver {
    tolerance: Tolerance,
    max_branches: Option<u64>,
}

impl ExactSolver {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            max_branches: None,
        }
    }

    /// Abort with [`SettleError::BranchLimitExceeded`] after `limit` tentative transfers.
    pub fn with_branch_limit(mut self, limit: Option<u64>) -> Self {
        self.max_branches = limit;
        self
    }

    /// Find a minimal settlement of `balances`.
    ///
    /// Balances are visited in ascending `(balance, participant)` order, so
    /// the result is deterministic. Fewer than two non-zero balances settle
    /// with no transfers.
    pub fn solve(&self, balances: &BalanceMap) -> Result<ExactSolution, SettleError> {
        balances.verify_balanced(self.tolerance)?;
        let sorted = balances.sorted(self.tolerance);
        if sorted.len() < 2 {
            return Ok(ExactSolution {
                transfers: Vec::new(),
                branches: 0,
            });
        }

        let (debts, parties): (Vec<Decimal>, Vec<PartyId>) = sorted.into_iter().unzip();
        let mut search = Search {
            debts,
            tolerance: self.tolerance,
            branches: 0,
            limit: self.max_branches,
        };

        let moves = search.backtrack(0)?.ok_or_else(|| SettleError::Unbalanced {
            residual: balances.total(),
            tolerance: self.tolerance.value(),
        })?;
        debug!(
            "exact search settled {} balances with {} transfers after {} branches",
            parties.len(),
            moves.len(),
            search.branches
        );

        let transfers = moves
            .into_iter()
            .map(|m| Edge::new(parties[m.payer].clone(), parties[m.payee].clone(), m.amount))
            .collect();
        Ok(ExactSolution {
            transfers,
            branches: search.branches,
        })
    }
}

/// A transfer between two arena positions.
#[derive(Debug, Clone, Copy)]
struct Move {
    payer: usize,
    payee: usize,
    amount: Decimal,
}

/// Working state: the balance arena is mutated in place and every
/// tentative change is undone before the next sibling branch.
struct Search {
    debts: Vec<Decimal>,
    tolerance: Tolerance,
    branches: u64,
    limit: Option<u64>,
}

impl Search {
    /// Fewest moves settling positions `start..`, or `None` when they
    /// cannot be settled.
    fn backtrack(&mut self, start: usize) -> Result<Option<Vec<Move>>, SettleError> {
        let mut i = start;
        while i < self.debts.len() && self.tolerance.is_zero(self.debts[i]) {
            i += 1;
        }
        if i == self.debts.len() {
            return Ok(Some(Vec::new()));
        }

        let current = self.debts[i];
        let mut best: Option<Vec<Move>> = None;
        let mut tried: Vec<Decimal> = Vec::new();

        for j in (i + 1)..self.debts.len() {
            let other = self.debts[j];
            if !self.tolerance.opposite_signs(current, other) {
                continue;
            }
            // equal balances lead to identical subtrees
            if tried.contains(&other) {
                continue;
            }
            tried.push(other);

            self.branches += 1;
            if let Some(limit) = self.limit {
                if self.branches > limit {
                    return Err(SettleError::BranchLimitExceeded { limit });
                }
            }

            self.debts[j] = other + current;
            let rest = self.backtrack(i + 1);
            self.debts[j] = other;

            if let Some(rest) = rest? {
                let improves = best
                    .as_ref()
                    .map_or(true, |b| rest.len() + 1 < b.len());
                if improves {
                    let (payer, payee) = if current.is_sign_negative() { (i, j) } else { (j, i) };
                    let mut moves = Vec::with_capacity(rest.len() + 1);
                    moves.push(Move {
                        payer,
                        payee,
                        amount: current.abs(),
                    });
                    moves.extend(rest);
                    best = Some(moves);
                }
            }
        }

        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balances(entries: &[(&str, Decimal)]) -> BalanceMap {
        entries
            .iter()
            .map(|(p, v)| (PartyId::new(*p), *v))
            .collect()
    }

    fn settles(map: &BalanceMap, transfers: &[Edge]) -> bool {
        let mut working = map.clone();
        for t in transfers {
            working.apply_transfer(t).unwrap();
        }
        working.is_settled(Tolerance::DEFAULT)
    }

    fn solve(map: &BalanceMap) -> ExactSolution {
        ExactSolver::new(Tolerance::DEFAULT).solve(map).unwrap()
    }

    #[test]
    fn test_single_pair() {
        let map = balances(&[("A", dec!(-15)), ("B", dec!(15))]);
        let solution = solve(&map);
        assert_eq!(
            solution.transfers,
            vec![Edge::new(PartyId::new("A"), PartyId::new("B"), dec!(15))]
        );
    }

    #[test]
    fn test_two_matched_pairs() {
        let map = balances(&[("A", dec!(10)), ("B", dec!(5)), ("C", dec!(-5)), ("D", dec!(-10))]);
        let solution = solve(&map);
        assert_eq!(solution.count(), 2);
        assert!(settles(&map, &solution.transfers));
        assert!(solution
            .transfers
            .contains(&Edge::new(PartyId::new("D"), PartyId::new("A"), dec!(10))));
        assert!(solution
            .transfers
            .contains(&Edge::new(PartyId::new("C"), PartyId::new("B"), dec!(5))));
    }

    #[test]
    fn test_beats_naive_pairing() {
        // 6 + 4 = 10 and 3 + 2 = 5: two zero-sum groups, so 6 - 2 = 4 transfers
        let map = balances(&[
            ("A", dec!(-6)),
            ("B", dec!(-4)),
            ("C", dec!(10)),
            ("D", dec!(-3)),
            ("E", dec!(-2)),
            ("F", dec!(5)),
        ]);
        let solution = solve(&map);
        assert_eq!(solution.count(), 4);
        assert!(settles(&map, &solution.transfers));
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(solve(&BalanceMap::new()).count(), 0);
        let settled = balances(&[("A", Decimal::ZERO), ("B", Decimal::ZERO)]);
        assert_eq!(solve(&settled).count(), 0);
    }

    #[test]
    fn test_near_zero_residue_ignored() {
        let third = dec!(10) / dec!(3);
        let map = balances(&[
            ("A", third),
            ("B", third),
            ("C", dec!(10) - third - third),
            ("D", dec!(-10)),
        ]);
        let solution = solve(&map);
        assert_eq!(solution.count(), 3);
        assert!(settles(&map, &solution.transfers));
    }

    #[test]
    fn test_unbalanced_rejected() {
        let map = balances(&[("A", dec!(10)), ("B", dec!(-4))]);
        let err = ExactSolver::new(Tolerance::DEFAULT).solve(&map).unwrap_err();
        assert!(matches!(err, SettleError::Unbalanced { .. }));
    }

    #[test]
    fn test_branch_limit() {
        let map = balances(&[
            ("A", dec!(-7)),
            ("B", dec!(-5)),
            ("C", dec!(-3)),
            ("D", dec!(4)),
            ("E", dec!(5)),
            ("F", dec!(6)),
        ]);
        let err = ExactSolver::new(Tolerance::DEFAULT)
            .with_branch_limit(Some(2))
            .solve(&map)
            .unwrap_err();
        assert_eq!(err, SettleError::BranchLimitExceeded { limit: 2 });

        let solution = ExactSolver::new(Tolerance::DEFAULT)
            .with_branch_limit(Some(1_000_000))
            .solve(&map)
            .unwrap();
        assert!(settles(&map, &solution.transfers));
        assert!(solution.branches > 2);
    }
}
