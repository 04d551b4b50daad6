//! Historical Quartet batches shipped with the report.
//!
//! The table has one row per historical Quartet set with the columns
//! `sample`, `group`, `batch`, the sixteen `<snv|indel>_<donor>-<precision|recall>`
//! values on the 0..1 scale, and `snv_mendelian` / `indel_mendelian`.

use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, error, info};

use crate::helper_functions::read_tsv;
use crate::models::{AssessmentError, AssessmentResult, Dataset, Donor, DonorCall, DonorCalls, SampleRecord, VariantType};

pub struct QuartetReference {
    pub path: PathBuf,
}

fn numeric_columns() -> Vec<String> {
    let mut cols = Vec::new();
    for variant in VariantType::ALL {
        for donor in Donor::ALL {
            cols.push(variant.donor_precision_column(donor));
            cols.push(variant.donor_recall_column(donor));
        }
        cols.push(variant.mendelian_column());
    }
    cols
}

fn cast_numeric(df: DataFrame) -> PolarsResult<DataFrame> {
    let exprs: Vec<Expr> = numeric_columns()
        .iter()
        .map(|name| col(name.as_str()).cast(DataType::Float64))
        .collect();
    df.lazy().with_columns(exprs).collect()
}

impl Dataset for QuartetReference {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading Quartet reference population from {}", self.path.display());
        let df = match read_tsv(&self.path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read reference population: {}", e);
                return Err(e);
            }
        };
        cast_numeric(df)
    }
}

impl QuartetReference {
    /// Loads the reference rows; `MissingInput` when the file is absent.
    pub fn load_records(&self) -> AssessmentResult<Vec<SampleRecord>> {
        if !self.path.is_file() {
            return Err(AssessmentError::MissingInput(format!("no file matched: {}", self.path.display())));
        }
        let df = self.load()?;
        let records = records_from_frame(&df)?;
        if records.is_empty() {
            debug!("Reference population at {} is empty", self.path.display());
        }
        Ok(records)
    }
}

fn text_value(df: &DataFrame, name: &str, row: usize) -> AssessmentResult<String> {
    df.column(name)?
        .str()?
        .get(row)
        .map(str::to_string)
        .ok_or_else(|| AssessmentError::SchemaMismatch(format!("reference row {} has no {}", row, name)))
}

fn float_value(df: &DataFrame, name: &str, row: usize) -> AssessmentResult<f64> {
    df.column(name)?
        .f64()?
        .get(row)
        .ok_or_else(|| AssessmentError::SchemaMismatch(format!("reference row {} has no {}", row, name)))
}

fn donor_calls(df: &DataFrame, variant: VariantType, row: usize) -> AssessmentResult<DonorCalls> {
    let mut calls = [DonorCall::default(); 4];
    for donor in Donor::ALL {
        calls[donor.index()] = DonorCall::new(
            float_value(df, &variant.donor_precision_column(donor), row)?,
            float_value(df, &variant.donor_recall_column(donor), row)?,
        );
    }
    Ok(calls)
}

pub(crate) fn records_from_frame(df: &DataFrame) -> AssessmentResult<Vec<SampleRecord>> {
    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        records.push(SampleRecord {
            sample: text_value(df, "sample", row)?,
            group: text_value(df, "group", row)?,
            batch: text_value(df, "batch", row)?,
            snv: donor_calls(df, VariantType::Snv, row)?,
            indel: donor_calls(df, VariantType::Indel, row)?,
            snv_mendelian: float_value(df, &VariantType::Snv.mendelian_column(), row)?,
            indel_mendelian: float_value(df, &VariantType::Indel.mendelian_column(), row)?,
        });
    }
    Ok(records)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    /// Writes a reference table where every rate of a row equals its `value`.
    pub(crate) fn write_reference(path: &std::path::Path, rows: &[(&str, &str, &str, f64)]) {
        let mut header = vec!["sample".to_string(), "group".to_string(), "batch".to_string()];
        header.extend(numeric_columns());
        let mut body = header.join("\t");
        body.push('\n');
        for (sample, group, batch, value) in rows {
            let mut fields = vec![sample.to_string(), group.to_string(), batch.to_string()];
            fields.extend(std::iter::repeat(value.to_string()).take(numeric_columns().len()));
            body.push_str(&fields.join("\t"));
            body.push('\n');
        }
        fs::write(path, body).unwrap();
    }

    #[test]
    fn missing_reference_is_reported() {
        let reference = QuartetReference { path: PathBuf::from("/no/such/quartet_reference.txt") };
        assert!(matches!(reference.load_records(), Err(AssessmentError::MissingInput(_))));
    }

    #[test]
    fn rows_become_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quartet_reference.txt");
        write_reference(&path, &[("ARD_1", "PCR", "ARD", 0.9), ("BGI_1", "PCR-free", "BGI", 1.0)]);

        let records = QuartetReference { path }.load_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].batch, "ARD");
        assert_eq!(records[0].snv[Donor::F7.index()], DonorCall::new(0.9, 0.9));
        // integer-looking columns are cast to floats
        assert_eq!(records[1].indel_mendelian, 1.0);
        assert_eq!(records[1].group, "PCR-free");
    }
}
