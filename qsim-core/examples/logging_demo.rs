//! Demonstration of logging in qsim-core
//!
//! Runs a few repetitions of a busy two-operator model with detailed logging
//! enabled, so every dispatch, wait and release is visible.
//!
//! ```bash
//! cargo run --example logging_demo
//! RUST_LOG=qsim_core=debug cargo run --example logging_demo
//! ```

use qsim_core::{init_detailed_simulation_logging, Model, ModelConfig, RepetitionOutcome};
use tracing::info;

fn main() {
    init_detailed_simulation_logging();

    let config = match ModelConfig::new(0.0, 10.0, [(0.8, 0.5, 1.5), (1.2, 0.0, 2.0)], 2) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };
    info!(load = config.load_factor(), "Starting logging demo");

    let mut model = match Model::with_seed(config, 17) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("failed to build model: {err}");
            return;
        }
    };

    for _ in 0..3 {
        match model.run_once() {
            Ok(RepetitionOutcome::Measured { average_wait, stats }) => info!(
                average_wait,
                completed = stats.completed,
                retries = stats.retries,
                "Measured"
            ),
            Ok(RepetitionOutcome::Unreliable { stats }) => info!(
                leftover = stats.leftover_events,
                busy = stats.busy_at_end,
                "Unreliable"
            ),
            Err(err) => {
                eprintln!("repetition failed: {err}");
                return;
            }
        }
    }

    info!(repetitions = model.repetitions(), "Logging demo completed");
}
