// src/models.rs

use std::fmt;

use polars::prelude::*;
use serde::Serialize;

/// Batch identifier shared by every submitted set.
pub const QUERIED_BATCH: &str = "Queried_Data";
/// Group label of submitted sets in the scatter plots.
pub const QUERIED_GROUP: &str = "Queried";

/// Anything that reads one table role from disk.
pub trait Dataset {
    fn load(&self) -> PolarsResult<DataFrame>;
}

pub fn polars_err(e: Box<dyn std::error::Error>) -> PolarsError {
    PolarsError::ComputeError(format!("{}", e).into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Donors and variant types
// ─────────────────────────────────────────────────────────────────────────────

/// The four reference individuals of one Quartet batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Donor {
    D5,
    D6,
    F7,
    M8,
}

impl Donor {
    pub const ALL: [Donor; 4] = [Donor::D5, Donor::D6, Donor::F7, Donor::M8];

    /// Sample-name fragments identifying the donor, checked in `ALL` order.
    pub fn aliases(self) -> [&'static str; 2] {
        match self {
            Donor::D5 => ["LCL5", "D5"],
            Donor::D6 => ["LCL6", "D6"],
            Donor::F7 => ["LCL7", "F7"],
            Donor::M8 => ["LCL8", "M8"],
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Donor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Donor::D5 => "D5",
            Donor::D6 => "D6",
            Donor::F7 => "F7",
            Donor::M8 => "M8",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantType {
    Snv,
    Indel,
}

impl VariantType {
    pub const ALL: [VariantType; 2] = [VariantType::Snv, VariantType::Indel];

    /// Column prefix used by the reference population table.
    pub fn prefix(self) -> &'static str {
        match self {
            VariantType::Snv => "snv",
            VariantType::Indel => "indel",
        }
    }

    /// Header label used by the submitted precision/recall tables.
    pub fn label(self) -> &'static str {
        match self {
            VariantType::Snv => "SNV",
            VariantType::Indel => "INDEL",
        }
    }

    pub fn precision_column(self) -> String {
        format!("{} precision", self.label())
    }

    pub fn recall_column(self) -> String {
        format!("{} recall", self.label())
    }

    pub fn mendelian_column(self) -> String {
        format!("{}_mendelian", self.prefix())
    }

    pub fn donor_precision_column(self, donor: Donor) -> String {
        format!("{}_{}-precision", self.prefix(), donor)
    }

    pub fn donor_recall_column(self, donor: Donor) -> String {
        format!("{}_{}-recall", self.prefix(), donor)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-sample records
// ─────────────────────────────────────────────────────────────────────────────

/// Precision and recall of one donor, both on the 0..1 scale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DonorCall {
    pub precision: f64,
    pub recall: f64,
}

impl DonorCall {
    pub fn new(precision: f64, recall: f64) -> Self {
        Self { precision, recall }
    }

    /// Harmonic mean of precision and recall, 0 when both are 0.
    pub fn f1(&self) -> f64 {
        let denom = self.precision + self.recall;
        if denom == 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / denom
        }
    }
}

/// Calls for all four donors of one variant type, indexed by `Donor::index`.
pub type DonorCalls = [DonorCall; 4];

/// One complete Quartet set: four donors, both variant types, plus the
/// family-averaged Mendelian concordance.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub sample: String,
    pub group: String,
    pub batch: String,
    pub snv: DonorCalls,
    pub indel: DonorCalls,
    pub snv_mendelian: f64,
    pub indel_mendelian: f64,
}

impl SampleRecord {
    pub fn calls(&self, variant: VariantType) -> &DonorCalls {
        match variant {
            VariantType::Snv => &self.snv,
            VariantType::Indel => &self.indel,
        }
    }

    pub fn mendelian(&self, variant: VariantType) -> f64 {
        match variant {
            VariantType::Snv => self.snv_mendelian,
            VariantType::Indel => self.indel_mendelian,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scored metrics
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PrecisionSnv,
    PrecisionIndel,
    RecallSnv,
    RecallIndel,
    MendelianSnv,
    MendelianIndel,
    Total,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::PrecisionSnv,
        Metric::PrecisionIndel,
        Metric::RecallSnv,
        Metric::RecallIndel,
        Metric::MendelianSnv,
        Metric::MendelianIndel,
        Metric::Total,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::PrecisionSnv => "precision_snv",
            Metric::PrecisionIndel => "precision_indel",
            Metric::RecallSnv => "recall_snv",
            Metric::RecallIndel => "recall_indel",
            Metric::MendelianSnv => "mendelian_snv",
            Metric::MendelianIndel => "mendelian_indel",
            Metric::Total => "total",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Metric::PrecisionSnv => "Precision (SNV)",
            Metric::PrecisionIndel => "Precision (INDEL)",
            Metric::RecallSnv => "Recall (SNV)",
            Metric::RecallIndel => "Recall (INDEL)",
            Metric::MendelianSnv => "Mendelian Concordance Rate (SNV)",
            Metric::MendelianIndel => "Mendelian Concordance Rate (INDEL)",
            Metric::Total => "Total Score",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Aggregated scores of one batch. All values are rounded to 5 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchScore {
    pub batch: String,
    pub precision_snv: f64,
    pub precision_indel: f64,
    pub recall_snv: f64,
    pub recall_indel: f64,
    pub mendelian_snv: f64,
    pub mendelian_indel: f64,
    pub total: f64,
}

impl BatchScore {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PrecisionSnv => self.precision_snv,
            Metric::PrecisionIndel => self.precision_indel,
            Metric::RecallSnv => self.recall_snv,
            Metric::RecallIndel => self.recall_indel,
            Metric::MendelianSnv => self.mendelian_snv,
            Metric::MendelianIndel => self.mendelian_indel,
            Metric::Total => self.total,
        }
    }

    pub fn is_queried(&self) -> bool {
        self.batch == QUERIED_BATCH
    }
}

/// Quartile Index of a metric value against the batch population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PerformanceTier {
    Bad,
    Fair,
    Good,
    Great,
}

impl PerformanceTier {
    pub const ALL: [PerformanceTier; 4] = [
        PerformanceTier::Bad,
        PerformanceTier::Fair,
        PerformanceTier::Good,
        PerformanceTier::Great,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceTier::Bad => "Bad",
            PerformanceTier::Fair => "Fair",
            PerformanceTier::Good => "Good",
            PerformanceTier::Great => "Great",
        }
    }

    /// Cell colour used by the evaluation table.
    pub fn colour(self) -> &'static str {
        match self {
            PerformanceTier::Bad => "#b80d0d",
            PerformanceTier::Fair => "#d97c11",
            PerformanceTier::Good => "#70c402",
            PerformanceTier::Great => "#0f9115",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The 15th, 50th and 85th percentile of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileThresholds {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum AssessmentError {
    /// No input found for a table role
    MissingInput(String),
    /// Row or column does not follow the Quartet schema
    SchemaMismatch(String),
    /// Zero denominator or non-finite intermediate
    DegenerateComputation(String),
    /// No batches to classify or rank
    EmptyPopulation,
    Polars(PolarsError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for AssessmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput(msg) => write!(f, "Missing input: {}", msg),
            Self::SchemaMismatch(msg) => write!(f, "Schema mismatch: {}", msg),
            Self::DegenerateComputation(msg) => write!(f, "Degenerate computation: {}", msg),
            Self::EmptyPopulation => write!(f, "No batches available to assess"),
            Self::Polars(e) => write!(f, "Polars error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for AssessmentError {}

impl From<PolarsError> for AssessmentError {
    fn from(e: PolarsError) -> Self {
        Self::Polars(e)
    }
}

impl From<std::io::Error> for AssessmentError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for AssessmentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

pub type AssessmentResult<T> = Result<T, AssessmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_calls_have_unit_f1() {
        let calls = [DonorCall::new(1.0, 1.0); 4];
        let mean = calls.iter().map(DonorCall::f1).sum::<f64>() / calls.len() as f64;
        assert_eq!(mean, 1.0);
    }

    #[test]
    fn zero_calls_have_zero_f1() {
        assert_eq!(DonorCall::new(0.0, 0.0).f1(), 0.0);
    }

    #[test]
    fn reference_column_names() {
        assert_eq!(VariantType::Snv.donor_precision_column(Donor::D5), "snv_D5-precision");
        assert_eq!(VariantType::Indel.donor_recall_column(Donor::M8), "indel_M8-recall");
        assert_eq!(VariantType::Indel.mendelian_column(), "indel_mendelian");
        assert_eq!(VariantType::Snv.precision_column(), "SNV precision");
    }

    #[test]
    fn metric_order_matches_table_order() {
        let names: Vec<&str> = Metric::ALL.iter().map(|m| m.full_name()).collect();
        assert_eq!(names.first(), Some(&"Precision (SNV)"));
        assert_eq!(names.last(), Some(&"Total Score"));
        assert!(Metric::ALL.iter().enumerate().all(|(i, m)| m.index() == i));
    }
}
