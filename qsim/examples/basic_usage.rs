//! Basic usage: one generator, one operator, a batch of repetitions.
//!
//! Reads a configuration from the path given as the first argument, or uses
//! the default (σ = 4, service in [0, 2), one operator, 20 s horizon).
//!
//! ```bash
//! cargo run --example basic_usage
//! cargo run --example basic_usage -- config.json
//! ```

use qsim::prelude::*;
use tracing::info;

const REPETITIONS: usize = 1_000;
const BASE_SEED: u64 = 2024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_simulation_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => read_config_from_path(path)?,
        None => ModelConfig::default(),
    };
    info!(load = config.load_factor(), operators = config.operators, "Configuration loaded");

    let outcomes = run_parallel(&config, REPETITIONS, BASE_SEED)?;

    for policy in [UnreliablePolicy::Exclude, UnreliablePolicy::AsZero, UnreliablePolicy::Poison] {
        let summary = SampleSummary::from_outcomes(&outcomes, policy);
        match (summary.mean, summary.ci_low, summary.ci_high) {
            (Some(mean), Some(lo), Some(hi)) => println!(
                "{policy:?}: mean wait {mean:.4}s, 95% CI [{lo:.4}, {hi:.4}], dispersion {:.4}, {} unreliable",
                summary.dispersion.unwrap_or_default(),
                summary.unreliable,
            ),
            _ => println!("{policy:?}: no estimate ({} of {} unreliable)", summary.unreliable, summary.count),
        }
    }

    let retried = run_parallel_with_retry(&config, 100, BASE_SEED, RetryPolicy::default())?;
    let extra: u32 = retried.iter().map(|r| r.attempts - 1).sum();
    println!("retry policy: {extra} extra runs over 100 repetitions");

    let out = std::env::temp_dir().join("qsim_basic_usage.json");
    write_outcomes_to_path(
        &out,
        &ResultsFile {
            config,
            base_seed: Some(BASE_SEED),
            summary: Some(SampleSummary::from_outcomes(&outcomes, UnreliablePolicy::Exclude)),
            outcomes,
        },
    )?;
    println!("results written to {}", out.display());
    Ok(())
}
