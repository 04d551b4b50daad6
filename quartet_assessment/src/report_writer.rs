use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::performance::ClassifiedBatch;
use crate::helper_functions::dataframe_to_csv;
use crate::models::{AssessmentResult, Metric};
use crate::pipeline::AssessmentReport;

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> AssessmentResult<()> {
    let path = dir.join(name);
    serde_json::to_writer_pretty(File::create(&path)?, value)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Flat per-batch table: the seven scores and their tiers.
pub fn quality_metrics_frame(batches: &[ClassifiedBatch]) -> PolarsResult<DataFrame> {
    let mut columns = Vec::with_capacity(1 + 2 * Metric::ALL.len());
    let names: Vec<String> = batches.iter().map(|b| b.score.batch.clone()).collect();
    columns.push(Column::from(Series::new(PlSmallStr::from("batch"), names)));

    for metric in Metric::ALL {
        let values: Vec<f64> = batches.iter().map(|b| b.score.value(metric)).collect();
        columns.push(Column::from(Series::new(PlSmallStr::from(metric.key()), values)));
    }
    for metric in Metric::ALL {
        let tiers: Vec<&str> = batches.iter().map(|b| b.tier(metric).as_str()).collect();
        let name = format!("{}_performance", metric.key());
        columns.push(Column::from(Series::new(PlSmallStr::from(name.as_str()), tiers)));
    }

    DataFrame::new(columns)
}

/// Writes every rendered section of `report` under `output_dir`.
pub fn write_report(report: &AssessmentReport, output_dir: &Path) -> AssessmentResult<()> {
    fs::create_dir_all(output_dir)?;

    match &report.summary {
        Some(summary) => {
            write_json(output_dir, "conclusion_summary.json", summary)?;
            let path = output_dir.join("conclusion_overview.html");
            fs::write(&path, summary.overview.to_html())?;
            info!("Wrote {}", path.display());
        }
        None => debug!("No evaluation summary, skipping conclusion_summary"),
    }

    write_json(output_dir, "snv_performance.json", &report.snv_scatter)?;
    write_json(output_dir, "indel_performance.json", &report.indel_scatter)?;
    write_json(output_dir, "plot_quality_score.json", &report.heatmap)?;
    write_json(output_dir, "quantile_thresholds.json", &report.classification.thresholds)?;
    write_json(output_dir, "batch_ranks.json", &report.ranks)?;

    let mut df = quality_metrics_frame(&report.classification.batches)?;
    dataframe_to_csv(&mut df, &output_dir.join("quality_metrics.tsv"), b'\t')?;
    Ok(())
}
