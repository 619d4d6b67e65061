//! Offline Training Binary
//!
//! Runs the full training pipeline once over the configured source and
//! prints the report as JSON.
//!
//! Run with: `DATA_SOURCE=sqlite:purchases.db cargo run --bin train-models`

use nextride::{init_tracing, ServerConfig, TrainingPipeline};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ServerConfig::from_env();
    let source = config.source.open();
    let pipeline = TrainingPipeline::new(config.seed);

    let report = pipeline.run(source.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_complete() {
        eprintln!("Some training stages did not complete; see \"stages\" above.");
    }

    Ok(())
}
