use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, error, info, warn};

use crate::helper_functions::read_tsv;
use crate::models::{AssessmentError, AssessmentResult, Dataset, Donor, DonorCall, DonorCalls, VariantType};

const SAMPLE_COL: &str = "Sample";
const DONOR_COL: &str = "donor";

/// One `variants.calling.qc.txt`: a row per donor, percentages on the 0..100 scale.
pub struct PrecisionRecallSummary {
    pub path: PathBuf,
}

/// Donor calls of one submitted set, before the Mendelian join.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionRecallSet {
    pub snv: DonorCalls,
    pub indel: DonorCalls,
}

fn percentage_columns() -> Vec<String> {
    VariantType::ALL
        .iter()
        .flat_map(|v| [v.precision_column(), v.recall_column()])
        .collect()
}

/// Divides the percentage columns by 100 and rounds to 4 decimals.
fn rescale_percentages(df: DataFrame) -> PolarsResult<DataFrame> {
    let exprs: Vec<Expr> = percentage_columns()
        .iter()
        .map(|name| {
            (col(name.as_str()).cast(DataType::Float64) / lit(100.0))
                .round(4)
                .alias(name.as_str())
        })
        .collect();

    df.lazy().with_columns(exprs).collect()
}

/// Index of the first donor whose aliases occur in the sample name, null otherwise.
fn donor_expr() -> Expr {
    let mut expr = lit(NULL).cast(DataType::Int32);
    for donor in Donor::ALL.iter().rev() {
        let pattern = donor.aliases().join("|");
        expr = when(col(SAMPLE_COL).str().contains(lit(pattern), false))
            .then(lit(donor.index() as i32))
            .otherwise(expr);
    }
    expr.alias(DONOR_COL)
}

fn tag_donors(df: DataFrame) -> PolarsResult<DataFrame> {
    df.lazy().with_column(donor_expr()).collect()
}

impl Dataset for PrecisionRecallSummary {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading precision/recall summary from {}", self.path.display());
        let df = match read_tsv(&self.path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read precision/recall summary: {}", e);
                return Err(e);
            }
        };
        debug!("Loaded {} rows", df.height());

        let df = rescale_percentages(df)?;
        tag_donors(df)
    }
}

impl PrecisionRecallSummary {
    /// Collapses the donor rows into one set.
    ///
    /// Rows naming none of the four donors are dropped and counted; an
    /// incomplete set yields `None`. With `strict` both cases are errors.
    pub fn load_set(&self, strict: bool) -> AssessmentResult<Option<PrecisionRecallSet>> {
        let df = self.load()?;
        let samples = df.column(SAMPLE_COL)?.str()?;
        let donors = df.column(DONOR_COL)?.i32()?;

        let snv_precision = df.column(VariantType::Snv.precision_column().as_str())?.f64()?;
        let snv_recall = df.column(VariantType::Snv.recall_column().as_str())?.f64()?;
        let indel_precision = df.column(VariantType::Indel.precision_column().as_str())?.f64()?;
        let indel_recall = df.column(VariantType::Indel.recall_column().as_str())?.f64()?;

        let mut snv: [Option<DonorCall>; 4] = [None; 4];
        let mut indel: [Option<DonorCall>; 4] = [None; 4];
        let mut unmatched = 0usize;
        let mut incomplete = 0usize;

        for i in 0..df.height() {
            let Some(donor) = donors.get(i) else {
                unmatched += 1;
                debug!("Row {} ({:?}) of {} names no donor", i, samples.get(i), self.path.display());
                continue;
            };
            let values = (
                snv_precision.get(i),
                snv_recall.get(i),
                indel_precision.get(i),
                indel_recall.get(i),
            );
            let (Some(sp), Some(sr), Some(ip), Some(ir)) = values else {
                incomplete += 1;
                debug!("Row {} ({:?}) of {} has empty percentages", i, samples.get(i), self.path.display());
                continue;
            };
            let idx = donor as usize;
            if snv[idx].is_some() {
                warn!("Donor {} appears twice in {}, keeping the later row", Donor::ALL[idx], self.path.display());
            }
            snv[idx] = Some(DonorCall::new(sp, sr));
            indel[idx] = Some(DonorCall::new(ip, ir));
        }

        if unmatched > 0 {
            warn!("{} row(s) of {} matched no Quartet donor", unmatched, self.path.display());
            if strict {
                return Err(AssessmentError::SchemaMismatch(format!(
                    "{} unmatched row(s) in {}",
                    unmatched,
                    self.path.display()
                )));
            }
        }
        if incomplete > 0 {
            warn!("{} donor row(s) of {} lack a precision or recall value", incomplete, self.path.display());
            if strict {
                return Err(AssessmentError::SchemaMismatch(format!(
                    "{} donor row(s) with missing values in {}",
                    incomplete,
                    self.path.display()
                )));
            }
        }

        let missing: Vec<String> = Donor::ALL
            .iter()
            .filter(|d| snv[d.index()].is_none())
            .map(|d| d.to_string())
            .collect();
        if !missing.is_empty() {
            let msg = format!("{} lacks donor(s) {}", self.path.display(), missing.join(", "));
            if strict {
                return Err(AssessmentError::SchemaMismatch(msg));
            }
            warn!("Skipping incomplete set: {}", msg);
            return Ok(None);
        }

        Ok(Some(PrecisionRecallSet {
            snv: snv.map(Option::unwrap_or_default),
            indel: indel.map(Option::unwrap_or_default),
        }))
    }
}
