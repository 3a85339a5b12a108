//! Weekend trip example.
//!
//! Five friends share a cabin, groceries and a car. The trip produces a
//! tangle of debts; the engine reduces them to the fewest transfers.

use debt_simplifier::core::balance::Tolerance;
use debt_simplifier::core::edge::RawEdge;
use debt_simplifier::core::party::PartyId;
use debt_simplifier::core::transaction::Transaction;
use debt_simplifier::graph::transfer_graph::render_graphviz;
use debt_simplifier::optimization::settlement::{SettlementConfig, SettlementEngine, Strategy};
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  debt-simplifier: Weekend Trip Example   ║");
    println!("╚══════════════════════════════════════════╝\n");

    let ana = PartyId::new("ana");
    let ben = PartyId::new("ben");
    let cleo = PartyId::new("cleo");
    let dev = PartyId::new("dev");
    let eli = PartyId::new("eli");
    let everyone = vec![ana.clone(), ben.clone(), cleo.clone(), dev.clone(), eli.clone()];

    // --- Scenario 1: Shared expenses ---
    println!("━━━ Scenario 1: Shared Expenses ━━━\n");

    let expenses = [
        (ana.clone(), dec!(450), everyone.clone()),
        (ben.clone(), dec!(120), everyone.clone()),
        (cleo.clone(), dec!(60), vec![cleo.clone(), dev.clone()]),
        (dev.clone(), dec!(85.50), vec![ana.clone(), ben.clone(), eli.clone()]),
        (eli.clone(), dec!(30), vec![ben.clone(), cleo.clone()]),
    ];
    let mut transactions = Vec::new();
    for (payer, amount, payees) in expenses {
        match Transaction::new(payer, amount, payees) {
            Ok(tx) => transactions.push(tx),
            Err(e) => eprintln!("skipping expense: {}", e),
        }
    }

    let engine = SettlementEngine::new(SettlementConfig::default());
    match engine.settle_transactions(&transactions) {
        Ok(settlement) => println!("{}", settlement),
        Err(e) => eprintln!("settlement failed: {}", e),
    }

    // --- Scenario 2: Direct debts with a wildcard ---
    println!("━━━ Scenario 2: Direct Debts and `*` ━━━\n");

    // "* -> ana: 100" means everyone owes ana a share of 100 for fuel.
    let edges = vec![
        RawEdge::new("ben", "cleo", dec!(25)),
        RawEdge::new("cleo", "dev", dec!(25)),
        RawEdge::new("dev", "ben", dec!(10)),
        RawEdge::new("*", "ana", dec!(100)),
    ];

    for strategy in [Strategy::Exact, Strategy::Greedy] {
        let engine = SettlementEngine::new(SettlementConfig {
            strategy,
            ..Default::default()
        });
        match engine.settle_edges(&edges, &everyone) {
            Ok(settlement) => {
                println!(
                    "  {:<8} {} transfers, {} moved",
                    strategy.to_string(),
                    settlement.transfer_count(),
                    settlement.total_transferred().round_dp(2).normalize()
                );
                if strategy == Strategy::Exact {
                    debug_assert!(settlement.verify(Tolerance::DEFAULT).is_ok());
                    println!("\n{}", render_graphviz(settlement.transfers()));
                }
            }
            Err(e) => eprintln!("settlement failed: {}", e),
        }
    }
}
