pub mod mendelian;
pub mod precision_recall;
pub mod reference;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::AssessmentConfig;
use crate::helper_functions::discover_files;
use crate::models::{AssessmentError, AssessmentResult, SampleRecord, QUERIED_BATCH, QUERIED_GROUP};
use mendelian::{MendelianRates, MendelianSummary};
use precision_recall::{PrecisionRecallSet, PrecisionRecallSummary};

/// Synthetic sample id of the n-th (1-based) submitted set.
pub fn queried_sample_id(n: usize) -> String {
    format!("Queried_Data_Set{}", n)
}

fn discover_role(config: &AssessmentConfig, pattern: &str, role: &str) -> AssessmentResult<Vec<PathBuf>> {
    let regex = Regex::new(pattern)
        .map_err(|e| AssessmentError::SchemaMismatch(format!("invalid {} pattern '{}': {}", role, pattern, e)))?;
    let files = discover_files(&config.input_dir, &regex)?;
    if files.is_empty() {
        debug!("No file matched: {} ({}) under {}", role, pattern, config.input_dir.display());
    }
    Ok(files)
}

/// Reads every submitted precision/recall and Mendelian summary and joins
/// them set by set into complete Quartet records.
///
/// Sets are numbered in discovery order per role; the n-th precision/recall
/// file pairs with the n-th Mendelian file.
pub fn extract_queried(config: &AssessmentConfig) -> AssessmentResult<Vec<SampleRecord>> {
    let pr_files = discover_role(config, &config.precision_recall_pattern, "precision/recall summary")?;
    let mendelian_files = discover_role(config, &config.mendelian_pattern, "Mendelian summary")?;

    let strict = config.strict_donor_matching;
    let mut pr_sets = Vec::new();
    for (i, path) in pr_files.into_iter().enumerate() {
        let summary = PrecisionRecallSummary { path };
        if let Some(Some(set)) = tolerate(summary.load_set(strict), strict, &summary.path)? {
            pr_sets.push((queried_sample_id(i + 1), set));
        }
    }

    let mut mendelian_sets = HashMap::new();
    for (i, path) in mendelian_files.into_iter().enumerate() {
        let summary = MendelianSummary { path };
        if let Some(rates) = tolerate(summary.load_rates(), strict, &summary.path)? {
            mendelian_sets.insert(queried_sample_id(i + 1), rates);
        }
    }

    let records = join_sets(pr_sets, &mendelian_sets);
    info!("Extracted {} submitted Quartet set(s)", records.len());
    Ok(records)
}

/// A file that cannot be read into a set only loses that set, unless `strict`.
fn tolerate<T>(result: AssessmentResult<T>, strict: bool, path: &Path) -> AssessmentResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ (AssessmentError::SchemaMismatch(_) | AssessmentError::Polars(_))) if !strict => {
            warn!("Dropping submitted file {}: {}", path.display(), e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Inner join on the synthetic sample id, keeping precision/recall order.
fn join_sets(
    pr_sets: Vec<(String, PrecisionRecallSet)>,
    mendelian_sets: &HashMap<String, MendelianRates>,
) -> Vec<SampleRecord> {
    pr_sets
        .into_iter()
        .filter_map(|(sample, set)| match mendelian_sets.get(&sample) {
            Some(rates) => Some(SampleRecord {
                sample,
                group: QUERIED_GROUP.to_string(),
                batch: QUERIED_BATCH.to_string(),
                snv: set.snv,
                indel: set.indel,
                snv_mendelian: rates.snv,
                indel_mendelian: rates.indel,
            }),
            None => {
                debug!("{} has no Mendelian summary, dropping it", sample);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DonorCall;
    use std::fs;

    fn config_for(dir: &std::path::Path) -> AssessmentConfig {
        AssessmentConfig {
            input_dir: dir.to_path_buf(),
            ..AssessmentConfig::default()
        }
    }

    #[test]
    fn sets_are_joined_by_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        let pr = "Sample\tSNV precision\tINDEL precision\tSNV recall\tINDEL recall\n\
                  LCL5\t100\t100\t100\t100\nLCL6\t100\t100\t100\t100\n\
                  LCL7\t100\t100\t100\t100\nLCL8\t100\t100\t100\t100\n";
        fs::write(dir.path().join("a.variants.calling.qc.txt"), pr).unwrap();
        fs::write(dir.path().join("b.variants.calling.qc.txt"), pr).unwrap();
        fs::write(
            dir.path().join("a.summary.txt"),
            "Family\tMendelian_Concordance_Rate\nQ.SNV\t1\nQ.INDEL\t1\n",
        )
        .unwrap();

        let records = extract_queried(&config_for(dir.path())).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sample, "Queried_Data_Set1");
        assert_eq!(records[0].batch, QUERIED_BATCH);
        assert_eq!(records[0].snv, [DonorCall::new(1.0, 1.0); 4]);
        assert_eq!(records[0].indel_mendelian, 1.0);
    }

    #[test]
    fn no_inputs_is_an_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let records = extract_queried(&config_for(dir.path())).unwrap();
        assert!(records.is_empty());
    }
}
