//! Command driver for RevLib circuits.
//!
//! Run with:
//! ```bash
//! cargo run --example qmdd -- equiv a.real b.real
//! cargo run --example qmdd -- sift circuit.real --fixpoint
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;

use qmdd_rs::circuit::Circuit;
use qmdd_rs::config::QmddConfig;
use qmdd_rs::edge::Edge;
use qmdd_rs::qmdd::Qmdd;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Node store size (in bits, so the actual size is `2^size` nodes).
    #[clap(long, value_name = "INT", default_value = "20")]
    storage_bits: usize,

    /// Computed table size (in bits).
    #[clap(long, value_name = "INT", default_value = "16")]
    cache_bits: usize,

    /// Log every operator call.
    #[clap(long)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check two circuits for equivalence.
    Equiv { first: PathBuf, second: PathBuf },
    /// Build a circuit and print statistics and the top of the diagram.
    Stats {
        file: PathBuf,
        /// Maximum number of nodes to list.
        #[clap(long, value_name = "INT", default_value = "20")]
        limit: usize,
    },
    /// Build a circuit and minimize it by sifting.
    Sift {
        file: PathBuf,
        /// Repeat passes until no further improvement.
        #[clap(long)]
        fixpoint: bool,
    },
    /// Build a circuit and try every variable order.
    Exact { file: PathBuf },
}

fn load(path: &PathBuf, reference: Option<&Circuit>) -> color_eyre::Result<Circuit> {
    let text = std::fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    let circuit = match reference {
        Some(reference) => Circuit::parse_matching(&text, reference),
        None => Circuit::parse(&text),
    };
    circuit.wrap_err_with(|| format!("parsing {}", path.display()))
}

fn build(qmdd: &Qmdd, path: &PathBuf) -> color_eyre::Result<Edge> {
    let circuit = load(path, None)?;
    let e = qmdd.build_circuit(&circuit)?;
    qmdd.incref(e)?;
    println!(
        "Built {} ({} lines, {} gates): {} active nodes",
        path.display(),
        circuit.lines.len(),
        circuit.gates.len(),
        qmdd.active_node_count()
    );
    Ok(e)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.debug {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let config = QmddConfig::default()
        .with_storage_bits(args.storage_bits)
        .with_cache_bits(args.cache_bits);
    let qmdd = Qmdd::new(config);

    match &args.command {
        Command::Equiv { first, second } => {
            let c1 = load(first, None)?;
            let c2 = load(second, Some(&c1))?;
            let e1 = qmdd.build_circuit(&c1)?;
            qmdd.incref(e1)?;
            let e2 = qmdd.build_circuit(&c2)?;
            qmdd.incref(e2)?;
            if qmdd.equal(e1, e2) {
                println!("Circuits are equivalent");
            } else {
                println!("Circuits are NOT equivalent");
            }
        }
        Command::Stats { file, limit } => {
            let e = build(&qmdd, file)?;
            println!("Order: {}", qmdd.order_labels().join(" "));
            println!("Per level (bottom-up): {:?}", qmdd.level_node_counts());
            println!("Unitary: {}", qmdd.is_unitary(e)?);
            print!("{}", qmdd.debug_tree(e, *limit));
        }
        Command::Sift { file, fixpoint } => {
            let e = build(&qmdd, file)?;
            let mut roots = vec![e];
            let stats = if *fixpoint {
                qmdd.sift_to_fixpoint(&mut roots)?
            } else {
                qmdd.sift(&mut roots)?
            };
            println!(
                "Sifting: {} -> {} nodes ({:.1}% reduction), largest {}, {} swaps, {} passes",
                stats.initial_size,
                stats.final_size,
                stats.reduction_percent(),
                stats.largest_size,
                stats.swaps,
                stats.passes
            );
            println!("Order: {}", qmdd.order_labels().join(" "));
        }
        Command::Exact { file } => {
            let e = build(&qmdd, file)?;
            let mut roots = vec![e];
            let stats = qmdd.exact_reorder(&mut roots)?;
            println!(
                "Exact: {} orders, {} -> {} nodes",
                stats.permutations, stats.initial_size, stats.best_size
            );
            println!("Order: {}", qmdd.order_labels().join(" "));
        }
    }

    println!("Stats: {}", qmdd.stats());
    println!("Total time: {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
