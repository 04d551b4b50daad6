use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AssessmentConfig;
use crate::helper_functions::project_root;
use crate::pipeline::run_assessment;
use crate::report_writer::write_report;

mod analysis;
mod config;
mod data_handling;
mod helper_functions;
mod models;
mod pipeline;
mod report_writer;

fn main() -> anyhow::Result<()> {
    // Setup logging and project configuration
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let project_root = project_root();
    let config = AssessmentConfig::load(&project_root).context("loading assessment configuration")?;

    // Halt execution if the host disabled the assessment summary
    if config.disable_plugin {
        info!("Assessment summary disabled, nothing to do");
        return Ok(());
    }

    info!("Starting the Quartet assessment summary");

    match run_assessment(&config).context("assessing Quartet batches")? {
        Some(report) => {
            write_report(&report, &config.output_dir)
                .with_context(|| format!("writing report to {}", config.output_dir.display()))?;
            info!(
                "Assessed {} Quartet set(s) in {} batch(es), written to {}",
                report.records.len(),
                report.classification.batches.len(),
                config.output_dir.display()
            );
        }
        None => info!("No batches to assess, no section rendered"),
    }

    Ok(())
}
