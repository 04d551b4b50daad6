//! Per-batch aggregation of Quartet sets into the seven scored metrics.
//!
//! Precision and recall are averaged over every donor of every set in the
//! batch; Mendelian rates are averaged over the sets. SNV and INDEL values of
//! each metric family are then combined with a beta-weighted harmonic mean
//! and the total score is the mean of the three combined values.

use tracing::{debug, warn};

use crate::helper_functions::round_to;
use crate::models::{AssessmentError, AssessmentResult, BatchScore, DonorCall, SampleRecord, VariantType};

pub const DEFAULT_BETA: f64 = 0.5;
const SCORE_DECIMALS: i32 = 5;

/// `(1 + beta) * a * b / (beta * a + b)`.
pub fn weighted_harmonic_mean(a: f64, b: f64, beta: f64) -> AssessmentResult<f64> {
    let denom = beta * a + b;
    if denom == 0.0 || !denom.is_finite() {
        return Err(AssessmentError::DegenerateComputation(format!(
            "weighted harmonic mean of {} and {} has denominator {}",
            a, b, denom
        )));
    }
    Ok((1.0 + beta) * a * b / denom)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn mean_call<F>(records: &[&SampleRecord], variant: VariantType, pick: F) -> f64
where
    F: Fn(&DonorCall) -> f64,
{
    mean(records.iter().flat_map(|r| r.calls(variant).iter().map(&pick)))
}

/// Combines the SNV and INDEL value of one metric family; a zero denominator scores 0.
fn combine(batch: &str, family: &str, snv: f64, indel: f64, beta: f64) -> f64 {
    match weighted_harmonic_mean(snv, indel, beta) {
        Ok(v) => v,
        Err(e) => {
            warn!("{} {} scored 0: {}", batch, family, e);
            0.0
        }
    }
}

fn score_batch(batch: &str, records: &[&SampleRecord], beta: f64) -> BatchScore {
    let precision_snv = mean_call(records, VariantType::Snv, |c| c.precision);
    let precision_indel = mean_call(records, VariantType::Indel, |c| c.precision);
    let recall_snv = mean_call(records, VariantType::Snv, |c| c.recall);
    let recall_indel = mean_call(records, VariantType::Indel, |c| c.recall);
    let mendelian_snv = mean(records.iter().map(|r| r.snv_mendelian));
    let mendelian_indel = mean(records.iter().map(|r| r.indel_mendelian));

    let precision_beta = combine(batch, "precision", precision_snv, precision_indel, beta);
    let recall_beta = combine(batch, "recall", recall_snv, recall_indel, beta);
    let mendelian_beta = combine(batch, "mendelian", mendelian_snv, mendelian_indel, beta);
    let total = (precision_beta + recall_beta + mendelian_beta) / 3.0;

    BatchScore {
        batch: batch.to_string(),
        precision_snv: round_to(precision_snv, SCORE_DECIMALS),
        precision_indel: round_to(precision_indel, SCORE_DECIMALS),
        recall_snv: round_to(recall_snv, SCORE_DECIMALS),
        recall_indel: round_to(recall_indel, SCORE_DECIMALS),
        mendelian_snv: round_to(mendelian_snv, SCORE_DECIMALS),
        mendelian_indel: round_to(mendelian_indel, SCORE_DECIMALS),
        total: round_to(total, SCORE_DECIMALS),
    }
}

/// One score per distinct batch id, in order of first appearance.
pub fn aggregate_batches(records: &[SampleRecord], beta: f64) -> Vec<BatchScore> {
    let mut batches: Vec<&str> = Vec::new();
    for record in records {
        if !batches.contains(&record.batch.as_str()) {
            batches.push(&record.batch);
        }
    }

    batches
        .into_iter()
        .map(|batch| {
            let members: Vec<&SampleRecord> = records.iter().filter(|r| r.batch == batch).collect();
            let score = score_batch(batch, &members, beta);
            debug!("{:<20} total {:.5} ({} set(s))", batch, score.total, members.len());
            score
        })
        .collect()
}
