use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::models::polars_err;

pub fn project_root() -> PathBuf {
    match env::var_os("PROJECT_ROOT") {
        Some(val) => PathBuf::from(val),
        None => {
            // Fall back to current directory if PROJECT_ROOT not set
            env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        }
    }
}

/// Reads a tab-separated table with a header row.
pub fn read_tsv(file_path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|parse_options| parse_options.with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()
}

pub fn dataframe_to_csv(df: &mut DataFrame, path: &Path, separator: u8) -> PolarsResult<()> {
    let mut file = File::create(path).map_err(|e| polars_err(Box::new(e)))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(separator)
        .finish(df)?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Files anywhere under `dir` whose name matches `pattern`, sorted by path.
/// A missing directory yields no files.
pub fn discover_files(dir: &Path, pattern: &Regex) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!("Input directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(|name| pattern.is_match(name)) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn round_to_decimals() {
        assert_eq!(round_to(0.951_234_5, 4), 0.9512);
        assert_eq!(round_to(0.864_004_9, 5), 0.864);
    }

    #[test]
    fn discovery_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.variants.calling.qc.txt", "a.variants.calling.qc.txt", "notes.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let pattern = Regex::new(r"variants\.calling\.qc\.txt$").unwrap();
        let files = discover_files(dir.path(), &pattern).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.variants.calling.qc.txt", "b.variants.calling.qc.txt"]);
    }

    #[test]
    fn discovery_descends_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("call").join("benchmark");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("x.summary.txt"), "x").unwrap();
        fs::write(dir.path().join("y.summary.txt"), "x").unwrap();

        let pattern = Regex::new(r"\.summary\.txt$").unwrap();
        let files = discover_files(dir.path(), &pattern).unwrap();
        assert_eq!(files, vec![nested.join("x.summary.txt"), dir.path().join("y.summary.txt")]);
    }

    #[test]
    fn discovery_of_missing_dir_is_empty() {
        let pattern = Regex::new("x").unwrap();
        let files = discover_files(Path::new("/definitely/not/here"), &pattern).unwrap();
        assert!(files.is_empty());
    }
}
