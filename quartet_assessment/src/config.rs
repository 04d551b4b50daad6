use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::analysis::aggregation::DEFAULT_BETA;
use crate::models::AssessmentResult;

const CONFIG_ENV: &str = "ASSESSMENT_CONFIG";
const CONFIG_FILE: &str = "assessment_config.json";

/// Which batches feed the "Historical value (mean ± SD)" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoricalBaseline {
    /// Reference batches only; the submitted batch is left out.
    #[default]
    ReferenceOnly,
    /// Every scored batch, submitted one included.
    FullPopulation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub disable_plugin: bool,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub reference_path: PathBuf,
    /// Regex on file names of precision/recall summaries
    pub precision_recall_pattern: String,
    /// Regex on file names of Mendelian summaries
    pub mendelian_pattern: String,
    pub strict_donor_matching: bool,
    pub historical_baseline: HistoricalBaseline,
    pub beta: f64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            disable_plugin: false,
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("assessment"),
            reference_path: PathBuf::from("assets/quartet_reference.txt"),
            precision_recall_pattern: r"variants\.calling\.qc\.txt$".to_string(),
            mendelian_pattern: r"\.summary\.txt$".to_string(),
            strict_donor_matching: false,
            historical_baseline: HistoricalBaseline::ReferenceOnly,
            beta: DEFAULT_BETA,
        }
    }
}

impl AssessmentConfig {
    /// `$ASSESSMENT_CONFIG`, then `<root>/assessment_config.json`, then defaults.
    pub fn load(project_root: &Path) -> AssessmentResult<Self> {
        let path = match env::var_os(CONFIG_ENV) {
            Some(val) => Some(PathBuf::from(val)),
            None => Some(project_root.join(CONFIG_FILE)).filter(|p| p.exists()),
        };

        let config = match path {
            Some(path) => {
                info!("Reading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                Self::default()
            }
        };

        Ok(config.resolve_against(project_root))
    }

    pub fn from_file(path: &Path) -> AssessmentResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    fn resolve_against(mut self, root: &Path) -> Self {
        for path in [&mut self.input_dir, &mut self.output_dir, &mut self.reference_path] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }
}
