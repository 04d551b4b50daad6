use std::path::PathBuf;

use polars::prelude::*;
use tracing::{error, info};

use crate::helper_functions::read_tsv;
use crate::models::{AssessmentError, AssessmentResult, Dataset, VariantType};

const FAMILY_COL: &str = "Family";
const RATE_COL: &str = "Mendelian_Concordance_Rate";

/// One `<project>.summary.txt`: a row per family, family names end in `SNV` or `INDEL`.
pub struct MendelianSummary {
    pub path: PathBuf,
}

/// Family-averaged Mendelian concordance of one submitted set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MendelianRates {
    pub snv: f64,
    pub indel: f64,
}

fn mean_rate_expr(variant: VariantType) -> Expr {
    col(RATE_COL)
        .cast(DataType::Float64)
        .filter(col(FAMILY_COL).str().ends_with(lit(variant.label())))
        .mean()
        .alias(variant.mendelian_column().as_str())
}

fn summarise(df: DataFrame) -> PolarsResult<DataFrame> {
    df.lazy()
        .select([mean_rate_expr(VariantType::Snv), mean_rate_expr(VariantType::Indel)])
        .collect()
}

impl Dataset for MendelianSummary {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading Mendelian summary from {}", self.path.display());
        match read_tsv(&self.path) {
            Ok(df) => Ok(df),
            Err(e) => {
                error!("Failed to read Mendelian summary: {}", e);
                Err(e)
            }
        }
    }
}

impl MendelianSummary {
    pub fn load_rates(&self) -> AssessmentResult<MendelianRates> {
        let summary = summarise(self.load()?)?;

        let rate = |variant: VariantType| -> AssessmentResult<f64> {
            summary
                .column(variant.mendelian_column().as_str())?
                .f64()?
                .get(0)
                .ok_or_else(|| {
                    AssessmentError::SchemaMismatch(format!(
                        "no family ending in {} in {}",
                        variant.label(),
                        self.path.display()
                    ))
                })
        };

        Ok(MendelianRates {
            snv: rate(VariantType::Snv)?,
            indel: rate(VariantType::Indel)?,
        })
    }
}
