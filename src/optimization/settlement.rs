use crate::core::balance::{aggregate_edges, aggregate_transactions, BalanceMap, Tolerance};
use crate::core::edge::{Edge, RawEdge};
use crate::core::error::SettleError;
use crate::core::party::PartyId;
use crate::core::transaction::{ShareRounding, Transaction};
use crate::graph::star::{expand_star_edges, StarSplit};
use crate::optimization::exact::ExactSolver;
use crate::optimization::greedy::greedy_settle;
use log::{info, warn};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which algorithm settles the balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Backtracking search for the fewest transfers.
    Exact,
    /// Single-pass heuristic.
    Greedy,
    /// Exact search bounded by `max_branches`, greedy once the bound is hit.
    #[default]
    Auto,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exact => "exact",
            Self::Greedy => "greedy",
            Self::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "greedy" => Ok(Self::Greedy),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// Settlement knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub strategy: Strategy,
    /// Amounts at or below this magnitude count as zero.
    pub tolerance: Tolerance,
    /// Rounding of transaction shares.
    pub share_rounding: ShareRounding,
    /// Divisor policy for wildcard edges.
    pub star_split: StarSplit,
    /// Cap on exact-search branches; `None` searches without bound.
    pub max_branches: Option<u64>,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            tolerance: Tolerance::DEFAULT,
            share_rounding: ShareRounding::Exact,
            star_split: StarSplit::AllParticipants,
            max_branches: Some(1_000_000),
        }
    }
}

/// Outcome of settling one batch of debts.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    /// Non-zero balances that were settled.
    balances: BalanceMap,
    /// Settling transfers: `from` pays `to`.
    transfers: Vec<Edge>,
    /// Algorithm that produced `transfers`; never `Auto`.
    strategy: Strategy,
    /// Debt relationships fed into aggregation.
    input_edges: usize,
    /// Exact-search branches explored, zero for greedy.
    branches: u64,
    /// Every participant named by the input, sorted.
    participants: Vec<PartyId>,
    /// Wildcard edges that resolved to nobody.
    empty_wildcards: usize,
}

impl Settlement {
    pub fn balances(&self) -> &BalanceMap {
        &self.balances
    }

    pub fn transfers(&self) -> &[Edge] {
        &self.transfers
    }

    pub fn into_transfers(self) -> Vec<Edge> {
        self.transfers
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.len()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// True when the transfer count is proven minimal.
    pub fn is_minimal(&self) -> bool {
        self.strategy == Strategy::Exact
    }

    pub fn input_edges(&self) -> usize {
        self.input_edges
    }

    pub fn branches(&self) -> u64 {
        self.branches
    }

    pub fn participants(&self) -> &[PartyId] {
        &self.participants
    }

    pub fn empty_wildcards(&self) -> usize {
        self.empty_wildcards
    }

    /// Fewer than two participants: the input could not describe any debt.
    pub fn is_degenerate(&self) -> bool {
        self.participants.len() < 2
    }

    /// Total money moved by the transfers.
    pub fn total_transferred(&self) -> Decimal {
        self.transfers
            .iter()
            .fold(Decimal::ZERO, |total, t| total.saturating_add(t.amount()))
    }

    /// Share of input debts removed by settling, as a percentage.
    pub fn reduction_percent(&self) -> f64 {
        if self.input_edges == 0 {
            return 0.0;
        }
        let removed = self.input_edges.saturating_sub(self.transfers.len());
        let pct = Decimal::from(removed) * Decimal::from(100) / Decimal::from(self.input_edges);
        pct.to_f64().unwrap_or(0.0)
    }

    /// Apply the transfers to the balances and confirm nobody is left owing.
    pub fn verify(&self, tolerance: Tolerance) -> Result<(), SettleError> {
        let mut working = self.balances.clone();
        for transfer in &self.transfers {
            working.apply_transfer(transfer)?;
        }
        let unsettled = working
            .iter()
            .find(|(_, v)| !tolerance.is_zero(*v))
            .map(|(party, remaining)| (party.clone(), remaining));
        match unsettled {
            Some((party, remaining)) => Err(SettleError::Unsettled { party, remaining }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Settlement ===")?;
        writeln!(f, "Strategy:       {}", self.strategy)?;
        writeln!(f, "Participants:   {}", self.participants.len())?;
        writeln!(f, "Minimal:        {}", self.is_minimal())?;
        writeln!(f, "Debts in:       {}", self.input_edges)?;
        writeln!(f, "Transfers out:  {}", self.transfers.len())?;
        writeln!(f, "Reduction:      {:.1}%", self.reduction_percent())?;
        writeln!(f, "Total moved:    {}", self.total_transferred().round_dp(2).normalize())?;
        writeln!(f, "\n--- Balances ---")?;
        write!(f, "{}", self.balances)?;
        writeln!(f, "\n--- Transfers ---")?;
        for transfer in &self.transfers {
            writeln!(f, "  {}", transfer)?;
        }
        Ok(())
    }
}

/// Runs the pipeline: expansion, aggregation, settlement.
///
/// # Examples
///
/// ```
/// use debt_simplifier::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let engine = SettlementEngine::new(SettlementConfig::default());
/// let txs = vec![
///     Transaction::new(PartyId::new("X"), dec!(15), vec![PartyId::new("X"), PartyId::new("Y")]).unwrap(),
///     Transaction::new(PartyId::new("Y"), dec!(62), vec![PartyId::new("X"), PartyId::new("Y")]).unwrap(),
/// ];
/// let settlement = engine.settle_transactions(&txs).unwrap();
/// assert_eq!(settlement.transfer_count(), 1);
/// assert_eq!(settlement.transfers()[0].amount(), dec!(23.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettlementEngine {
    config: SettlementConfig,
}

impl SettlementEngine {
    pub fn new(config: SettlementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Settle a raw edge list, resolving wildcard edges against the
    /// declared and discovered participants first.
    pub fn settle_edges(
        &self,
        edges: &[RawEdge],
        declared: &[PartyId],
    ) -> Result<Settlement, SettleError> {
        let expansion = expand_star_edges(edges, declared, self.config.star_split);
        let balances = aggregate_edges(&expansion.edges, self.config.tolerance)?;
        let mut settlement = self.settle(balances, expansion.edges.len(), expansion.participants)?;
        settlement.empty_wildcards = expansion.empty_wildcards;
        Ok(settlement)
    }

    /// Settle shared expenses.
    pub fn settle_transactions(&self, transactions: &[Transaction]) -> Result<Settlement, SettleError> {
        let balances = aggregate_transactions(
            transactions,
            self.config.share_rounding,
            self.config.tolerance,
        )?;
        let input_edges = transactions.iter().map(|tx| tx.payees().len()).sum();
        let participants: BTreeSet<PartyId> = transactions
            .iter()
            .flat_map(|tx| std::iter::once(tx.payer()).chain(tx.payees()))
            .cloned()
            .collect();
        self.settle(balances, input_edges, participants.into_iter().collect())
    }

    /// Settle an already aggregated balance map.
    pub fn settle_balances(&self, balances: &BalanceMap) -> Result<Settlement, SettleError> {
        balances.verify_balanced(self.config.tolerance)?;
        let non_zero = balances.without_zeros(self.config.tolerance);
        let input_edges = non_zero.len();
        let participants = balances.iter().map(|(p, _)| p.clone()).collect();
        self.settle(non_zero, input_edges, participants)
    }

    fn settle(
        &self,
        balances: BalanceMap,
        input_edges: usize,
        participants: Vec<PartyId>,
    ) -> Result<Settlement, SettleError> {
        let tolerance = self.config.tolerance;
        let (transfers, strategy, branches) = match self.config.strategy {
            Strategy::Greedy => (greedy_settle(&balances, tolerance), Strategy::Greedy, 0),
            Strategy::Exact => {
                let solution = self.exact_solver().solve(&balances)?;
                (solution.transfers, Strategy::Exact, solution.branches)
            }
            Strategy::Auto => match self.exact_solver().solve(&balances) {
                Ok(solution) => (solution.transfers, Strategy::Exact, solution.branches),
                Err(SettleError::BranchLimitExceeded { limit }) => {
                    warn!(
                        "exact search over {} balances exceeded {} branches, settling greedily",
                        balances.len(),
                        limit
                    );
                    (greedy_settle(&balances, tolerance), Strategy::Greedy, limit)
                }
                Err(e) => return Err(e),
            },
        };
        info!(
            "{} settlement: {} balances, {} transfers",
            strategy,
            balances.len(),
            transfers.len()
        );

        let settlement = Settlement {
            balances,
            transfers,
            strategy,
            input_edges,
            branches,
            participants,
            empty_wildcards: 0,
        };
        settlement.verify(tolerance)?;
        Ok(settlement)
    }

    fn exact_solver(&self) -> ExactSolver {
        ExactSolver::new(self.config.tolerance).with_branch_limit(self.config.max_branches)
    }
}
