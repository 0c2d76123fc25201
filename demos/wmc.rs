use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::bail;

use sdd_wmc::circuit::{Circuit, CircuitManager};
use sdd_wmc::flat::{nnf_wmc, psdd_log_wmc, sdd_wmc};
use sdd_wmc::smooth::{log_weighted_model_count, model_count, weighted_model_count, SmoothedEvaluator};
use sdd_wmc::stochastic::StochasticEvaluator;
use sdd_wmc::vtree::Vtree;
use sdd_wmc::weights::LiteralWeights;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Circuit file (`.nnf`, `.sdd` or `.psdd`), detected by its header.
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Vtree of an `.sdd` file; enables smoothed counting and sampling.
    #[clap(long, value_name = "FILE")]
    vtree: Option<PathBuf>,

    /// Observed literal for `.psdd` files (repeatable, e.g. `--observe -3`).
    #[clap(long = "observe", value_name = "LIT", allow_hyphen_values = true)]
    observe: Vec<i32>,

    /// Number of stochastic trials.
    #[clap(long, value_name = "INT", default_value = "10000")]
    bitlength: usize,

    /// Seed for stochastic sampling (random if omitted).
    #[clap(long, value_name = "INT")]
    seed: Option<u64>,
}

/// First token of the first non-comment line.
fn header_token(content: &str) -> Option<&str> {
    content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .find(|&token| token != "c")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let content = fs::read_to_string(&args.path)?;
    let weights = LiteralWeights::scan(&content)?.unwrap_or_default();
    println!("weights: {} literals configured", weights.len());

    match header_token(&content) {
        Some("nnf") => {
            println!("wmc = {}", nnf_wmc(&content, &weights)?);
        }
        Some("sdd") => {
            println!("wmc = {}", sdd_wmc(&content, &weights)?);

            if let Some(vtree_path) = &args.vtree {
                let vtree = Vtree::load(vtree_path)?;
                let (circuit, root) = Circuit::sdd_from_string(vtree, &content)?;
                println!(
                    "circuit: {} nodes over {} variables",
                    circuit.size(root),
                    circuit.var_count()
                );

                let evaluator = SmoothedEvaluator::new(&circuit, true, true);
                let mc = evaluator.depth_first(root, model_count)?;
                println!("smoothed model count = {}", mc);
                let wmc = evaluator.depth_first(root, weighted_model_count(&weights))?;
                let log_wmc = evaluator.depth_first(root, log_weighted_model_count(&weights))?;
                println!("smoothed wmc = {} (log {})", wmc, log_wmc);

                let mut stochastic = match args.seed {
                    Some(seed) => StochasticEvaluator::seeded(&circuit, root, weights.clone(), seed),
                    None => StochasticEvaluator::new(&circuit, root, weights.clone()),
                };
                let time_sampling = std::time::Instant::now();
                match stochastic.propagate(args.bitlength) {
                    Ok(estimate) => println!(
                        "stochastic wmc ~ {} ({} trials, exact {}) in {:.3} s",
                        estimate,
                        args.bitlength,
                        stochastic.propagate_exact()?,
                        time_sampling.elapsed().as_secs_f64()
                    ),
                    Err(e) => println!("stochastic wmc unavailable: {}", e),
                }
            }
        }
        Some("psdd") => {
            let observations: HashMap<u32, bool> = args
                .observe
                .iter()
                .filter(|&&lit| lit != 0)
                .map(|&lit| (lit.unsigned_abs(), lit > 0))
                .collect();
            let log_wmc = psdd_log_wmc(&content, &observations)?;
            println!("log wmc = {} (wmc = {})", log_wmc, log_wmc.exp());
        }
        Some(other) => bail!("unknown circuit format '{}'", other),
        None => bail!("{} is empty", args.path.display()),
    }

    println!("\nAll done in {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
