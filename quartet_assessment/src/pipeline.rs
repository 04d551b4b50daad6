// src/pipeline.rs
//
// Extraction -> aggregation -> classification -> ranking. Every stage takes
// the previous stage's output by reference and returns a new value.

use tracing::{debug, info, warn};

use crate::analysis::aggregation::aggregate_batches;
use crate::analysis::figures::{performance_scatter, quality_score_heatmap, Heatmap, ScatterPlot};
use crate::analysis::performance::{classify_batches, Classification};
use crate::analysis::ranking::{rank_batches, summarise_queried, EvaluationSummary, RankRow};
use crate::config::{AssessmentConfig, HistoricalBaseline};
use crate::data_handling::extract_queried;
use crate::data_handling::reference::QuartetReference;
use crate::models::{AssessmentError, AssessmentResult, SampleRecord, VariantType};

#[derive(Debug, Clone)]
pub struct AssessmentReport {
    /// Submitted sets followed by the reference population
    pub records: Vec<SampleRecord>,
    pub classification: Classification,
    pub ranks: Vec<RankRow>,
    /// Absent when nothing was submitted
    pub summary: Option<EvaluationSummary>,
    pub snv_scatter: ScatterPlot,
    pub indel_scatter: ScatterPlot,
    pub heatmap: Heatmap,
}

/// Reads the inputs named by `config` and assesses them.
pub fn run_assessment(config: &AssessmentConfig) -> AssessmentResult<Option<AssessmentReport>> {
    let queried = extract_queried(config)?;
    let reference = match (QuartetReference { path: config.reference_path.clone() }).load_records() {
        Ok(records) => records,
        Err(AssessmentError::MissingInput(msg)) => {
            debug!("{}, assessing without a reference population", msg);
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    info!("{} submitted set(s), {} reference set(s)", queried.len(), reference.len());
    if queried.is_empty() {
        warn!("No submitted Quartet set could be extracted");
    }
    build_report(queried, reference, config.beta, config.historical_baseline)
}

/// `Ok(None)` when there is no batch at all.
pub fn build_report(
    queried: Vec<SampleRecord>,
    reference: Vec<SampleRecord>,
    beta: f64,
    baseline: HistoricalBaseline,
) -> AssessmentResult<Option<AssessmentReport>> {
    let mut records = queried;
    records.extend(reference);

    let scores = aggregate_batches(&records, beta);
    let classification = match classify_batches(&scores) {
        Ok(c) => c,
        Err(AssessmentError::EmptyPopulation) => {
            info!("Empty batch population, no section rendered");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let ranks = rank_batches(&classification.batches);
    let summary = summarise_queried(&classification, &ranks, baseline)?;
    let snv_scatter = performance_scatter(&records, VariantType::Snv);
    let indel_scatter = performance_scatter(&records, VariantType::Indel);
    let heatmap = quality_score_heatmap(&classification.batches);

    Ok(Some(AssessmentReport {
        records,
        classification,
        ranks,
        summary,
        snv_scatter,
        indel_scatter,
        heatmap,
    }))
}
