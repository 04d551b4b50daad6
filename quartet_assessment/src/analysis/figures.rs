//! Data behind the scatter plots and the historical-score heatmap.

use std::cmp::Ordering;

use serde::Serialize;

use crate::analysis::performance::ClassifiedBatch;
use crate::models::{DonorCall, Metric, SampleRecord, VariantType};

/// Marker colour per scatter group; unknown groups fall back to black.
pub fn group_colour(group: &str) -> &'static str {
    match group {
        "PCR" => "#2f5c85",
        "PCR-free" => "#7ba1c7",
        "Queried" => "#bb1616",
        _ => "#000000",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    #[serde(rename = "Batch")]
    pub batch: String,
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "F1-score")]
    pub f1_score: f64,
    #[serde(rename = "Mendelian Concordance Rate")]
    pub mendelian_concordance_rate: f64,
    #[serde(rename = "Colour")]
    pub colour: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPlot {
    pub id: String,
    pub title: String,
    pub points: Vec<ScatterPoint>,
}

/// Donor-averaged F1 of one variant type.
pub fn mean_f1(record: &SampleRecord, variant: VariantType) -> f64 {
    let calls = record.calls(variant);
    calls.iter().map(DonorCall::f1).sum::<f64>() / calls.len() as f64
}

/// One point per Quartet set: Mendelian concordance against F1-score.
pub fn performance_scatter(records: &[SampleRecord], variant: VariantType) -> ScatterPlot {
    let points = records
        .iter()
        .map(|r| ScatterPoint {
            batch: r.sample.clone(),
            group: r.group.clone(),
            f1_score: mean_f1(r, variant),
            mendelian_concordance_rate: r.mendelian(variant),
            colour: group_colour(&r.group),
        })
        .collect();

    ScatterPlot {
        id: format!("{}_performance", variant.prefix()),
        title: format!("{} Performance", variant.label()),
        points,
    }
}

/// Batches along x (ascending total score), metrics along y.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub data: Vec<Vec<f64>>,
    pub xcats: Vec<String>,
    pub ycats: Vec<String>,
}

pub fn quality_score_heatmap(batches: &[ClassifiedBatch]) -> Heatmap {
    let mut ordered: Vec<&ClassifiedBatch> = batches.iter().collect();
    ordered.sort_by(|a, b| a.score.total.partial_cmp(&b.score.total).unwrap_or(Ordering::Equal));

    Heatmap {
        data: Metric::ALL
            .iter()
            .map(|&metric| ordered.iter().map(|b| b.score.value(metric)).collect())
            .collect(),
        xcats: ordered.iter().map(|b| b.score.batch.clone()).collect(),
        ycats: Metric::ALL.iter().map(|m| m.full_name().to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregation::{aggregate_batches, tests::uniform_record, DEFAULT_BETA};
    use crate::analysis::performance::classify_batches;

    #[test]
    fn perfect_donors_average_to_unit_f1() {
        let record = uniform_record("Queried_Data_Set1", "Queried", "Queried_Data", 1.0);
        assert_eq!(mean_f1(&record, VariantType::Snv), 1.0);
    }

    #[test]
    fn scatter_has_a_point_per_set() {
        let mut record = uniform_record("ARD_1", "PCR", "ARD", 0.9);
        record.indel = [DonorCall::new(0.8, 0.6); 4];
        record.indel_mendelian = 0.7;
        let plot = performance_scatter(&[record, uniform_record("ARD_2", "PCR", "ARD", 0.5)], VariantType::Indel);

        assert_eq!(plot.id, "indel_performance");
        assert_eq!(plot.title, "INDEL Performance");
        assert_eq!(plot.points.len(), 2);
        let expected = 2.0 * 0.8 * 0.6 / 1.4;
        assert!((plot.points[0].f1_score - expected).abs() < 1e-12);
        assert_eq!(plot.points[0].mendelian_concordance_rate, 0.7);
        assert_eq!(plot.points[0].batch, "ARD_1");
        assert_eq!(plot.points[0].colour, "#2f5c85");
    }

    #[test]
    fn heatmap_is_sorted_by_total() {
        let records = vec![
            uniform_record("B_1", "PCR", "B", 0.95),
            uniform_record("A_1", "PCR", "A", 0.8),
            uniform_record("C_1", "PCR", "C", 0.9),
        ];
        let classification = classify_batches(&aggregate_batches(&records, DEFAULT_BETA)).unwrap();
        let heatmap = quality_score_heatmap(&classification.batches);

        assert_eq!(heatmap.xcats, vec!["A", "C", "B"]);
        assert_eq!(heatmap.ycats.len(), 7);
        assert_eq!(heatmap.data.len(), 7);
        assert_eq!(heatmap.data[Metric::Total.index()], vec![0.8, 0.9, 0.95]);
    }
}
