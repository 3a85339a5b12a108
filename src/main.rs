//! debt-simplifier CLI
//!
//! Settle shared expenses from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Settle a debt file (or stdin) written as `A -> B: 12.5` lines
//! debt-simplifier settle trip.txt
//!
//! # Render the transfers as a Graphviz graph
//! debt-simplifier settle trip.txt --graphviz | dot -Tpng > trip.png
//!
//! # Settle a JSON list of shared expenses
//! debt-simplifier split --input expenses.json --rounding nearest
//!
//! # Generate random expenses for testing
//! debt-simplifier generate --parties 8 --transactions 20 --seed 1
//! ```

use chrono::{DateTime, Utc};
use debt_simplifier::core::party::PartyId;
use debt_simplifier::core::transaction::{ShareRounding, Transaction};
use debt_simplifier::graph::star::StarSplit;
use debt_simplifier::graph::transfer_graph::{render_graphviz, render_plain};
use debt_simplifier::input::parser::LineParser;
use debt_simplifier::optimization::settlement::{
    Settlement, SettlementConfig, SettlementEngine, Strategy,
};
use debt_simplifier::simulation::stress_test::{generate_transactions, ExpenseConfig};
use rust_decimal::Decimal;
use std::fs;
use std::io;
use std::process;

fn print_usage() {
    eprintln!(
        r#"debt-simplifier: settle shared expenses with as few transfers as possible

USAGE:
    debt-simplifier <COMMAND> [OPTIONS]

COMMANDS:
    settle      Settle a debt file written as `A -> B: amount` lines
    split       Settle a JSON list of shared expenses
    generate    Generate random shared expenses (for testing)
    help        Show this message

OPTIONS (settle, split):
    --strategy <S>        exact, greedy or auto (default: auto)
    --max-branches <N>    Exact-search budget before auto falls back to greedy
    --format <FORMAT>     Output format: text (default) or json
    --config <FILE>       JSON settlement config; flags override it
    -v, --verbose         Print participants, balances and totals

OPTIONS (settle):
    [FILE]                Debt file; stdin when omitted
    -g, --graphviz        Print transfers as a Graphviz digraph
    --star-split <P>      Wildcard divisor: all (default) or counterparties

OPTIONS (split):
    --input <FILE>        Path to JSON expenses file
    --rounding <R>        Share rounding: exact (default) or nearest

OPTIONS (generate):
    --parties <N>         Number of participants (default: 6)
    --transactions <N>    Number of expenses (default: 10)
    --seed <N>            Seed for reproducible output
    --output <FILE>       Write to file instead of stdout

INPUT FORMAT (settle):
    # comment
    alice -> bob: 12.50      bob is owed 12.50 by alice
    * -> carol: 30           everyone owes carol their share of 30
    dave                     declare a participant with no debts"#
    );
}

/// JSON schema for input expenses.
#[derive(serde::Deserialize, serde::Serialize)]
struct TransactionInput {
    payer: String,
    amount: String,
    payees: Vec<String>,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct TransactionsFile {
    transactions: Vec<TransactionInput>,
}

/// JSON output schema for settlement results.
#[derive(serde::Serialize)]
struct SettlementOutput {
    generated_at: DateTime<Utc>,
    strategy: String,
    minimal: bool,
    participants: Vec<String>,
    branches: u64,
    transfer_count: usize,
    total_transferred: String,
    balances: Vec<BalanceOutput>,
    transfers: Vec<TransferOutput>,
}

#[derive(serde::Serialize)]
struct BalanceOutput {
    party: String,
    balance: String,
    status: String,
}

#[derive(serde::Serialize)]
struct TransferOutput {
    from: String,
    to: String,
    amount: String,
}

/// Options shared by `settle` and `split`.
struct CommonOptions {
    config: SettlementConfig,
    format: String,
    verbose: bool,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str, what: &str) -> &'a str {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .unwrap_or_else(|| fail(format!("{} requires {}", flag, what)))
}

fn load_config(path: &str) -> SettlementConfig {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading config '{}': {}", path, e)));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| fail(format!("parsing config '{}': {}", path, e)))
}

/// Consume the options shared by `settle` and `split`; returns the
/// arguments it did not recognize.
fn parse_common(args: &[String]) -> (CommonOptions, Vec<String>) {
    let mut config = None;
    let mut strategy = None;
    let mut max_branches = None;
    let mut format = "text".to_string();
    let mut verbose = false;
    let mut rest = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config = Some(load_config(next_value(args, &mut i, "--config", "a file path")));
            }
            "--strategy" => {
                let value = next_value(args, &mut i, "--strategy", "exact, greedy or auto");
                strategy = Some(value.parse::<Strategy>().unwrap_or_else(|e| fail(e)));
            }
            "--max-branches" => {
                let value = next_value(args, &mut i, "--max-branches", "a number");
                max_branches = Some(
                    value
                        .parse::<u64>()
                        .unwrap_or_else(|_| fail("--max-branches requires a number")),
                );
            }
            "--format" => {
                format = next_value(args, &mut i, "--format", "'text' or 'json'").to_string();
            }
            "-v" | "--verbose" => verbose = true,
            other => rest.push(other.to_string()),
        }
        i += 1;
    }

    let mut config = config.unwrap_or_default();
    if let Some(strategy) = strategy {
        config.strategy = strategy;
    }
    if let Some(limit) = max_branches {
        config.max_branches = Some(limit);
    }
    (
        CommonOptions {
            config,
            format,
            verbose,
        },
        rest,
    )
}

fn print_settlement(settlement: &Settlement, options: &CommonOptions, graphviz: bool) {
    if settlement.is_degenerate() {
        eprintln!(
            "Warning: only {} participant(s) found; nothing to settle",
            settlement.participants().len()
        );
    }

    if options.verbose {
        let names: Vec<&str> = settlement.participants().iter().map(PartyId::as_str).collect();
        println!(
            "Found these {} unique nodes: [{}]",
            names.len(),
            names.join(", ")
        );
        let weights: Vec<String> = settlement
            .balances()
            .sorted(options.config.tolerance)
            .iter()
            .map(|(v, p)| format!("({}, {})", v.round_dp(2).normalize(), p))
            .collect();
        println!("Node weights: [{}]", weights.join(", "));
        if settlement.transfer_count() > 0 {
            println!(
                "Total money transacted: {}",
                settlement.total_transferred().round_dp(2).normalize()
            );
        }
        println!(
            "Strategy: {} ({} transfers{})",
            settlement.strategy(),
            settlement.transfer_count(),
            if settlement.is_minimal() { ", minimal" } else { "" }
        );
    }

    if options.format == "json" {
        let output = SettlementOutput {
            generated_at: Utc::now(),
            strategy: settlement.strategy().to_string(),
            minimal: settlement.is_minimal(),
            participants: settlement.participants().iter().map(|p| p.to_string()).collect(),
            branches: settlement.branches(),
            transfer_count: settlement.transfer_count(),
            total_transferred: settlement.total_transferred().to_string(),
            balances: settlement
                .balances()
                .iter()
                .map(|(party, balance)| BalanceOutput {
                    party: party.to_string(),
                    balance: balance.to_string(),
                    status: if balance > Decimal::ZERO {
                        "CREDITOR".to_string()
                    } else {
                        "DEBTOR".to_string()
                    },
                })
                .collect(),
            transfers: settlement
                .transfers()
                .iter()
                .map(|t| TransferOutput {
                    from: t.from().to_string(),
                    to: t.to().to_string(),
                    amount: t.amount().to_string(),
                })
                .collect(),
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(format!("serializing result: {}", e)),
        }
    } else if graphviz {
        print!("{}", render_graphviz(settlement.transfers()));
    } else {
        print!("{}", render_plain(settlement.transfers()));
    }
}

fn cmd_settle(args: &[String]) {
    let (mut options, rest) = parse_common(args);
    let mut graphviz = false;
    let mut input_path = None;
    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "-g" | "--graphviz" => graphviz = true,
            "--star-split" => {
                options.config.star_split =
                    match next_value(&rest, &mut i, "--star-split", "'all' or 'counterparties'") {
                        "all" => StarSplit::AllParticipants,
                        "counterparties" => StarSplit::Counterparties,
                        other => fail(format!("unknown star split '{}'", other)),
                    };
            }
            flag if flag.starts_with('-') => fail(format!("unknown option: {}", flag)),
            path => {
                if input_path.is_some() {
                    fail(format!("unexpected argument: {}", path));
                }
                input_path = Some(path.to_string());
            }
        }
        i += 1;
    }

    let content = match &input_path {
        Some(path) => fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("reading '{}': {}", path, e))),
        None => io::read_to_string(io::stdin())
            .unwrap_or_else(|e| fail(format!("reading stdin: {}", e))),
    };

    let parser = LineParser::new().unwrap_or_else(|e| fail(e));
    let input = parser.parse_str(&content).unwrap_or_else(|e| fail(e));

    let engine = SettlementEngine::new(options.config.clone());
    let settlement = engine
        .settle_edges(&input.edges, &input.declared)
        .unwrap_or_else(|e| fail(e));
    print_settlement(&settlement, &options, graphviz);
}

fn load_transactions(path: &str) -> Vec<Transaction> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));

    let file: TransactionsFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "transactions": [
    {{ "payer": "alice", "amount": "40", "payees": ["alice", "bob", "carol"] }}
  ]
}}"#
        );
        process::exit(1);
    });

    file.transactions
        .into_iter()
        .map(|tx| {
            let amount: Decimal = tx
                .amount
                .parse()
                .unwrap_or_else(|e| fail(format!("invalid amount '{}': {}", tx.amount, e)));
            let payees = tx.payees.iter().map(PartyId::new).collect();
            Transaction::new(PartyId::new(tx.payer), amount, payees).unwrap_or_else(|e| fail(e))
        })
        .collect()
}

fn cmd_split(args: &[String]) {
    let (mut options, rest) = parse_common(args);
    let mut input_path = None;
    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--input" => {
                input_path = Some(next_value(&rest, &mut i, "--input", "a file path").to_string());
            }
            "--rounding" => {
                options.config.share_rounding =
                    match next_value(&rest, &mut i, "--rounding", "'exact' or 'nearest'") {
                        "exact" => ShareRounding::Exact,
                        "nearest" => ShareRounding::NearestUnit,
                        other => fail(format!("unknown rounding '{}'", other)),
                    };
            }
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| fail("--input <FILE> is required"));
    let transactions = load_transactions(&path);

    if options.verbose {
        let residual: Decimal = transactions
            .iter()
            .map(|tx| tx.rounding_residual(options.config.share_rounding))
            .sum();
        println!("Rounding residual: {}", residual.round_dp(2).normalize());
    }

    let engine = SettlementEngine::new(options.config.clone());
    let settlement = engine
        .settle_transactions(&transactions)
        .unwrap_or_else(|e| fail(e));
    print_settlement(&settlement, &options, false);
}

fn cmd_generate(args: &[String]) {
    let mut config = ExpenseConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--parties" => {
                config.party_count = next_value(args, &mut i, "--parties", "a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--parties requires a number"));
            }
            "--transactions" => {
                config.transaction_count = next_value(args, &mut i, "--transactions", "a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--transactions requires a number"));
            }
            "--seed" => {
                config.seed = Some(
                    next_value(args, &mut i, "--seed", "a number")
                        .parse()
                        .unwrap_or_else(|_| fail("--seed requires a number")),
                );
            }
            "--output" => {
                output_path = Some(next_value(args, &mut i, "--output", "a file path").to_string());
            }
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let transactions = generate_transactions(&config);
    let output = TransactionsFile {
        transactions: transactions
            .iter()
            .map(|tx| TransactionInput {
                payer: tx.payer().to_string(),
                amount: tx.amount().to_string(),
                payees: tx.payees().iter().map(|p| p.to_string()).collect(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| fail(format!("serializing expenses: {}", e)));

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| fail(format!("writing '{}': {}", path, e)));
        eprintln!(
            "Generated {} expenses across {} participants → {}",
            transactions.len(),
            config.party_count,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];
    init_logging(rest.iter().any(|a| a == "-v" || a == "--verbose"));

    match command {
        "settle" => cmd_settle(rest),
        "split" => cmd_split(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
