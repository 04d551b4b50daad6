//! Ranking of the submitted batch against every scored batch, and the
//! evaluation table / overview gauge built from it.

use serde::Serialize;
use statrs::statistics::Statistics;
use tracing::{debug, info};

use crate::analysis::performance::{Classification, ClassifiedBatch};
use crate::config::HistoricalBaseline;
use crate::models::{AssessmentError, AssessmentResult, Metric, PerformanceTier};

/// Descending "min" ranking: rank 1 is the highest value and ties share the
/// lowest rank of the tied group.
pub fn min_rank_descending(values: &[f64]) -> Vec<usize> {
    values
        .iter()
        .map(|v| 1 + values.iter().filter(|other| *other > v).count())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankRow {
    pub batch: String,
    pub ranks: [usize; 7],
}

impl RankRow {
    pub fn rank(&self, metric: Metric) -> usize {
        self.ranks[metric.index()]
    }
}

/// One row per batch, in population order.
pub fn rank_batches(batches: &[ClassifiedBatch]) -> Vec<RankRow> {
    let per_metric: Vec<Vec<usize>> = Metric::ALL
        .iter()
        .map(|&metric| {
            let values: Vec<f64> = batches.iter().map(|b| b.score.value(metric)).collect();
            min_rank_descending(&values)
        })
        .collect();

    batches
        .iter()
        .enumerate()
        .map(|(i, b)| RankRow {
            batch: b.score.batch.clone(),
            ranks: Metric::ALL.map(|m| per_metric[m.index()][i]),
        })
        .collect()
}

/// Mean and sample standard deviation of a metric over the historical batches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalValue {
    pub mean: f64,
    pub sd: f64,
}

impl HistoricalValue {
    /// SD is 0 with fewer than two values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mean = values.iter().mean();
        let sd = if values.len() < 2 { 0.0 } else { values.iter().std_dev() };
        Some(Self { mean, sd })
    }

    pub fn formatted(&self) -> String {
        format!("{:.3} ± {:.3}", self.mean, self.sd)
    }
}

fn historical_value(batches: &[ClassifiedBatch], metric: Metric, baseline: HistoricalBaseline) -> AssessmentResult<HistoricalValue> {
    let all: Vec<f64> = batches.iter().map(|b| b.score.value(metric)).collect();
    let reference: Vec<f64> = batches
        .iter()
        .filter(|b| !b.score.is_queried())
        .map(|b| b.score.value(metric))
        .collect();

    let chosen = match baseline {
        HistoricalBaseline::FullPopulation => &all,
        HistoricalBaseline::ReferenceOnly if reference.is_empty() => {
            debug!("No reference batches for {}, using the full population", metric.key());
            &all
        }
        HistoricalBaseline::ReferenceOnly => &reference,
    };
    HistoricalValue::from_values(chosen).ok_or(AssessmentError::EmptyPopulation)
}

/// A row of the "Evaluation metrics" table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    #[serde(rename = "Quality Metrics")]
    pub quality_metric: String,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Historical value (mean ± SD)")]
    pub historical: String,
    #[serde(rename = "Rank")]
    pub rank: String,
    #[serde(rename = "Performance")]
    pub performance: PerformanceTier,
    #[serde(rename = "Performance colour")]
    pub colour: &'static str,
}

/// Share of batches per `total` tier and the submitted batch's position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_batches: usize,
    pub queried_rank: usize,
    /// Percent of batches in Bad, Fair, Good, Great order
    pub tier_percentages: [f64; 4],
    /// `rank / total * 100`
    pub queried_percentile: f64,
    /// `((total - rank) * 2 / total + 1 / total) * 100`; can exceed 100
    pub gauge_width: f64,
}

impl Overview {
    pub fn compute(batches: &[ClassifiedBatch], queried_rank: usize) -> AssessmentResult<Self> {
        let total_batches = batches.len();
        if total_batches == 0 {
            return Err(AssessmentError::EmptyPopulation);
        }
        let total = total_batches as f64;
        let rank = queried_rank as f64;

        let tier_percentages = PerformanceTier::ALL.map(|tier| {
            let count = batches.iter().filter(|b| b.tier(Metric::Total) == tier).count();
            count as f64 / total * 100.0
        });

        Ok(Self {
            total_batches,
            queried_rank,
            tier_percentages,
            queried_percentile: rank / total * 100.0,
            gauge_width: ((total - rank) * 2.0 / total + 1.0 / total) * 100.0,
        })
    }

    pub fn percent(value: f64) -> String {
        format!("{:.2}%", value)
    }

    /// Stacked progress bar plus the arrow marking the submitted batch.
    pub fn to_html(&self) -> String {
        let [bad, fair, good, great] = self.tier_percentages.map(Self::percent);
        format!(
            r#"
<div class="progress">
  <div class="progress-bar progress-bar-bad" style="width: {bad}" data-toggle="tooltip" title="" data-original-title="">Bad</div>
  <div class="progress-bar progress-bar-fair" style="width: {fair}" data-toggle="tooltip" title="" data-original-title="">Fair</div>
  <div class="progress-bar progress-bar-good" style="width: {good}" data-toggle="tooltip" title="" data-original-title="">Good</div>
  <div class="progress-bar progress-bar-great" style="width: {great}" data-toggle="tooltip" title="" data-original-title="">Great</div>
</div>

<div class="arrow" style="width: {gauge}">
  <svg class="tangle" transform="translate(0 -25)">
  </svg>
  <span class="label"> Your dataset </span>
</div>
"#,
            gauge = Self::percent(self.gauge_width),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub rows: Vec<EvaluationRow>,
    pub overview: Overview,
}

/// Evaluation table and overview for the submitted batch.
///
/// `Ok(None)` when nothing was submitted; the section is then skipped.
pub fn summarise_queried(
    classification: &Classification,
    ranks: &[RankRow],
    baseline: HistoricalBaseline,
) -> AssessmentResult<Option<EvaluationSummary>> {
    let batches = &classification.batches;
    if batches.is_empty() {
        return Err(AssessmentError::EmptyPopulation);
    }
    let Some(queried) = classification.queried() else {
        info!("No submitted batch, skipping the evaluation table");
        return Ok(None);
    };
    let queried_ranks = ranks
        .iter()
        .find(|r| r.batch == queried.score.batch)
        .ok_or_else(|| AssessmentError::DegenerateComputation("rank table does not cover the submitted batch".to_string()))?;
    let total = batches.len();

    let mut rows = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        rows.push(EvaluationRow {
            quality_metric: metric.full_name().to_string(),
            value: queried.score.value(metric),
            historical: historical_value(batches, metric, baseline)?.formatted(),
            rank: format!("{} / {}", queried_ranks.rank(metric), total),
            performance: queried.tier(metric),
            colour: queried.tier(metric).colour(),
        });
    }

    let overview = Overview::compute(batches, queried_ranks.rank(Metric::Total))?;
    info!(
        "Submitted batch ranks {} / {} on total score ({})",
        overview.queried_rank,
        total,
        queried.tier(Metric::Total)
    );
    Ok(Some(EvaluationSummary { rows, overview }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregation::{aggregate_batches, tests::uniform_record, DEFAULT_BETA};
    use crate::analysis::performance::classify_batches;
    use crate::models::QUERIED_BATCH;

    fn classified(totals: &[(&str, f64)]) -> Classification {
        let records: Vec<_> = totals
            .iter()
            .map(|(batch, v)| uniform_record(&format!("{batch}_1"), "PCR", batch, *v))
            .collect();
        classify_batches(&aggregate_batches(&records, DEFAULT_BETA)).unwrap()
    }

    #[test]
    fn ties_share_the_minimum_rank() {
        assert_eq!(min_rank_descending(&[0.5, 0.9, 0.5, 0.1]), vec![2, 1, 2, 4]);
        assert_eq!(min_rank_descending(&[0.7, 0.7, 0.7]), vec![1, 1, 1]);
    }

    #[test]
    fn raising_a_value_above_all_others_ranks_first() {
        let mut values = vec![0.3, 0.8, 0.6];
        values[0] = 0.81;
        assert_eq!(min_rank_descending(&values)[0], 1);
    }

    #[test]
    fn historical_sd_is_sample_sd() {
        let h = HistoricalValue::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((h.mean - 2.5).abs() < 1e-12);
        assert!((h.sd - 1.290_994_448_735_805_6).abs() < 1e-9);
        assert_eq!(h.formatted(), "2.500 ± 1.291");
        assert_eq!(HistoricalValue::from_values(&[0.4]).unwrap().sd, 0.0);
        assert_eq!(HistoricalValue::from_values(&[]), None);
    }

    #[test]
    fn gauge_for_top_rank_of_ten() {
        let c = classified(&[
            (QUERIED_BATCH, 1.0),
            ("A", 0.91),
            ("B", 0.92),
            ("C", 0.93),
            ("D", 0.94),
            ("E", 0.95),
            ("F", 0.96),
            ("G", 0.97),
            ("H", 0.98),
            ("I", 0.99),
        ]);
        let overview = Overview::compute(&c.batches, 1).unwrap();
        assert_eq!(Overview::percent(overview.queried_percentile), "10.00%");
        assert_eq!(Overview::percent(overview.gauge_width), "190.00%");
        let html = overview.to_html();
        assert!(html.contains("width: 190.00%"));
        assert!(html.contains("Your dataset"));
        let sum: f64 = overview.tier_percentages.iter().sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn summary_for_perfect_submission() {
        let c = classified(&[(QUERIED_BATCH, 1.0), ("A", 0.901), ("B", 0.95), ("C", 0.8)]);
        let ranks = rank_batches(&c.batches);
        let summary = summarise_queried(&c, &ranks, HistoricalBaseline::ReferenceOnly).unwrap().unwrap();

        let total = summary.rows.last().unwrap();
        assert_eq!(total.quality_metric, "Total Score");
        assert_eq!(total.value, 1.0);
        assert_eq!(total.rank, "1 / 4");
        assert_eq!(total.performance, PerformanceTier::Great);
        // reference-only baseline leaves the submitted 1.0 out
        assert_eq!(total.historical, "0.884 ± 0.076");
        assert_eq!(summary.overview.queried_rank, 1);

        let full = summarise_queried(&c, &ranks, HistoricalBaseline::FullPopulation).unwrap().unwrap();
        assert_eq!(full.rows[6].historical, "0.913 ± 0.085");
    }

    #[test]
    fn no_submission_skips_the_summary() {
        let c = classified(&[("A", 0.9), ("B", 0.95)]);
        let ranks = rank_batches(&c.batches);
        assert_eq!(summarise_queried(&c, &ranks, HistoricalBaseline::ReferenceOnly).unwrap(), None);
    }
}
