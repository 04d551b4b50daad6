use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::models::{AssessmentError, AssessmentResult, BatchScore, Metric, PerformanceTier, QuantileThresholds};

const Q1: f64 = 0.15;
const Q2: f64 = 0.50;
const Q3: f64 = 0.85;

/// Linearly interpolated quantile `p` of `values`, `None` when empty.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted_vals = values.to_vec();
    sorted_vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted_vals.len();

    let pos = (n as f64 - 1.0) * p;
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    if idx + 1 < n {
        Some(sorted_vals[idx] * (1.0 - frac) + sorted_vals[idx + 1] * frac)
    } else {
        Some(sorted_vals[idx])
    }
}

impl QuantileThresholds {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            q1: quantile(values, Q1)?,
            q2: quantile(values, Q2)?,
            q3: quantile(values, Q3)?,
        })
    }

    /// Lower bounds are inclusive: a value equal to Q2 is `Good`.
    pub fn classify(&self, value: f64) -> PerformanceTier {
        if value < self.q1 {
            PerformanceTier::Bad
        } else if value < self.q2 {
            PerformanceTier::Fair
        } else if value < self.q3 {
            PerformanceTier::Good
        } else {
            PerformanceTier::Great
        }
    }
}

/// A batch score with its tier on every metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedBatch {
    pub score: BatchScore,
    pub performance: [PerformanceTier; 7],
}

impl ClassifiedBatch {
    pub fn tier(&self, metric: Metric) -> PerformanceTier {
        self.performance[metric.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub thresholds: BTreeMap<Metric, QuantileThresholds>,
    pub batches: Vec<ClassifiedBatch>,
}

impl Classification {
    pub fn queried(&self) -> Option<&ClassifiedBatch> {
        self.batches.iter().find(|b| b.score.is_queried())
    }
}

/// Thresholds are computed over the whole population, submitted batch included.
pub fn classify_batches(scores: &[BatchScore]) -> AssessmentResult<Classification> {
    if scores.is_empty() {
        return Err(AssessmentError::EmptyPopulation);
    }

    let mut thresholds = BTreeMap::new();
    for metric in Metric::ALL {
        let values: Vec<f64> = scores.iter().map(|s| s.value(metric)).collect();
        let t = QuantileThresholds::from_values(&values).ok_or(AssessmentError::EmptyPopulation)?;
        debug!("{:<16} Q1 {:.5}  Q2 {:.5}  Q3 {:.5}", metric.key(), t.q1, t.q2, t.q3);
        thresholds.insert(metric, t);
    }

    let batches = scores
        .iter()
        .map(|score| {
            let performance = Metric::ALL.map(|metric| thresholds[&metric].classify(score.value(metric)));
            ClassifiedBatch { score: score.clone(), performance }
        })
        .collect();

    info!("Classified {} batch(es)", scores.len());
    Ok(Classification { thresholds, batches })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_with_total(name: &str, total: f64) -> BatchScore {
        BatchScore {
            batch: name.to_string(),
            precision_snv: total,
            precision_indel: total,
            recall_snv: total,
            recall_indel: total,
            mendelian_snv: total,
            mendelian_indel: total,
            total,
        }
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&values, 0.5), Some(3.0));
        assert!((quantile(&values, 0.15).unwrap() - 1.6).abs() < 1e-12);
        assert!((quantile(&values, 0.85).unwrap() - 4.4).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.85), Some(7.0));
    }

    #[test]
    fn lower_bounds_are_inclusive() {
        let t = QuantileThresholds { q1: 0.2, q2: 0.5, q3: 0.8 };
        assert_eq!(t.classify(0.19), PerformanceTier::Bad);
        assert_eq!(t.classify(0.2), PerformanceTier::Fair);
        assert_eq!(t.classify(0.49), PerformanceTier::Fair);
        assert_eq!(t.classify(0.5), PerformanceTier::Good);
        assert_eq!(t.classify(0.8), PerformanceTier::Great);
    }

    #[test]
    fn median_batch_is_good() {
        let scores: Vec<BatchScore> = [0.1, 0.2, 0.3, 0.4, 0.5]
            .iter()
            .enumerate()
            .map(|(i, v)| batch_with_total(&format!("B{i}"), *v))
            .collect();
        let classification = classify_batches(&scores).unwrap();
        let tiers: Vec<PerformanceTier> = classification.batches.iter().map(|b| b.tier(Metric::Total)).collect();
        assert_eq!(
            tiers,
            vec![
                PerformanceTier::Bad,
                PerformanceTier::Fair,
                PerformanceTier::Good,
                PerformanceTier::Good,
                PerformanceTier::Great,
            ]
        );
    }

    #[test]
    fn tiny_population_does_not_fail() {
        let classification = classify_batches(&[batch_with_total("only", 0.9)]).unwrap();
        assert_eq!(classification.batches[0].tier(Metric::Total), PerformanceTier::Great);
    }

    #[test]
    fn empty_population_is_an_error() {
        assert!(matches!(classify_batches(&[]), Err(AssessmentError::EmptyPopulation)));
    }
}
