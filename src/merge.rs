//! Regional CSV merge
//!
//! Concatenates every CSV file of a directory into one dataset, tagging each
//! row with a `region` column taken from its file name.

use crate::{FireWatchError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const REGION_COLUMN: &str = "region";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub files: usize,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// Region label of a file: the file name up to the first underscore.
///
/// A name without an underscore is used whole, extension included.
#[must_use]
pub fn region_label(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('_') {
        Some((prefix, _)) => prefix.to_string(),
        None => name,
    }
}

fn csv_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Merge every `*.csv` in `input_dir` into `output`.
///
/// Columns are the union of all headers in first-seen order followed by
/// `region`; cells missing from a file are left empty.
#[instrument]
pub fn merge_regional_csvs(input_dir: &Path, output: &Path) -> Result<MergeSummary> {
    let files = csv_files(input_dir)?;
    if files.is_empty() {
        return Err(FireWatchError::validation(format!(
            "No CSV files found in {}",
            input_dir.display()
        )));
    }

    let mut columns: Vec<String> = Vec::new();
    for file in &files {
        let mut reader = csv::Reader::from_path(file)?;
        for header in reader.headers()? {
            if header != REGION_COLUMN && !columns.iter().any(|c| c == header) {
                columns.push(header.to_string());
            }
        }
    }
    columns.push(REGION_COLUMN.to_string());
    let index: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let region_index = columns.len() - 1;

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(&columns)?;

    let mut rows = 0;
    for file in &files {
        let region = region_label(file);
        let mut reader = csv::Reader::from_path(file)?;
        let positions: Vec<usize> = reader
            .headers()?
            .iter()
            .map(|header| index.get(header).copied().unwrap_or(region_index))
            .collect();

        let mut file_rows = 0;
        for record in reader.records() {
            let record = record?;
            let mut row = vec![""; columns.len()];
            for (value, &position) in record.iter().zip(&positions) {
                row[position] = value;
            }
            row[region_index] = &region;
            writer.write_record(&row)?;
            file_rows += 1;
        }
        debug!("{}: {} rows, region {}", file.display(), file_rows, region);
        rows += file_rows;
    }
    writer.flush()?;

    info!(
        "Merged {} rows from {} files into {}",
        rows,
        files.len(),
        output.display()
    );
    Ok(MergeSummary {
        files: files.len(),
        rows,
        columns,
    })
}
