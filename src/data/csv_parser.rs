//! CSV, TSV and clipboard text parsing
//!
//! Parses delimited text into a [`TabularDataset`] with automatic type
//! inference, and writes datasets back out.
//!
//! ## Memory Limits
//!
//! To prevent unbounded memory growth:
//! - Files larger than 100MB are rejected (see [`MAX_CSV_SIZE_MB`])
//! - Content with more than 100,000 data rows is rejected by default
//!   (see [`MAX_CSV_ROWS`])

use crate::constants::{DEFAULT_DATASET_NAME, MAX_CSV_ROWS, MAX_CSV_SIZE_MB};
use crate::data::dataset::{DataOrigin, TabularDataset};
use crate::data::error::{DataError, DataResult};
use crate::data::infer::build_dataset;
use std::path::Path;
use tracing::debug;

/// Parse a CSV or TSV file into a dataset
///
/// Detects the delimiter from the file extension (.tsv uses tab) or, failing
/// that, from whichever delimiter appears most often in the first lines.
pub fn parse_csv_file(path: &Path) -> DataResult<TabularDataset> {
    parse_csv_file_with_limit(path, MAX_CSV_ROWS)
}

/// [`parse_csv_file`] with an explicit data row cap
pub fn parse_csv_file_with_limit(path: &Path, max_rows: usize) -> DataResult<TabularDataset> {
    let metadata = std::fs::metadata(path)?;
    let size_mb = metadata.len() / (1024 * 1024);
    if size_mb > MAX_CSV_SIZE_MB as u64 {
        return Err(DataError::TooLarge {
            size_mb,
            max_mb: MAX_CSV_SIZE_MB,
        });
    }

    let content = std::fs::read_to_string(path)?;
    let delimiter = detect_delimiter(path, &content);
    parse_delimited(&content, delimiter, Some(path), max_rows)
}

/// Parse CSV/TSV content from a string
pub fn parse_csv_content(
    content: &str,
    delimiter: char,
    source_path: Option<&Path>,
) -> DataResult<TabularDataset> {
    parse_delimited(content, delimiter, source_path, MAX_CSV_ROWS)
}

/// Parse text pasted from a spreadsheet or another table.
///
/// A tab on the first line selects tab separation, otherwise commas.
pub fn parse_clipboard_text(text: &str) -> DataResult<TabularDataset> {
    let first_line = text.lines().next().unwrap_or_default();
    let delimiter = if first_line.contains('\t') { '\t' } else { ',' };
    let ds = parse_delimited(text, delimiter, None, MAX_CSV_ROWS)?;
    Ok(ds.with_name("Clipboard").with_origin(DataOrigin::Clipboard))
}

fn parse_delimited(
    content: &str,
    delimiter: char,
    source_path: Option<&Path>,
    max_rows: usize,
) -> DataResult<TabularDataset> {
    if content.trim().is_empty() {
        return Err(DataError::EmptyFile);
    }

    let mut records = split_records(content, delimiter)
        .into_iter()
        .filter(|record| record.iter().any(|field| !field.is_empty()));

    let headers = records.next().ok_or(DataError::EmptyFile)?;
    if headers.is_empty() {
        return Err(DataError::NoColumns);
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in records {
        if rows.len() >= max_rows {
            return Err(DataError::TooManyRows {
                rows: rows.len() + 1,
                max_rows,
            });
        }
        rows.push(record);
    }

    let name = source_path
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_DATASET_NAME)
        .to_string();

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        delimiter = ?delimiter,
        "Parsed delimited text"
    );

    build_dataset(
        name,
        &headers,
        &rows,
        DataOrigin::Csv {
            path: source_path.map(Path::to_path_buf),
            delimiter,
        },
    )
}

/// Detect the delimiter to use for parsing
pub(crate) fn detect_delimiter(path: &Path, content: &str) -> char {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if ext.eq_ignore_ascii_case("tsv") {
            return '\t';
        }
    }

    let first_lines: String = content.lines().take(5).collect::<Vec<_>>().join("\n");

    let comma_count = first_lines.matches(',').count();
    let tab_count = first_lines.matches('\t').count();
    let semicolon_count = first_lines.matches(';').count();

    if tab_count > comma_count && tab_count > semicolon_count {
        '\t'
    } else if semicolon_count > comma_count {
        ';'
    } else {
        ','
    }
}

/// Split delimited text into records of trimmed fields.
///
/// Quoted fields may contain the delimiter, line breaks and doubled quotes.
fn split_records(content: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.trim().is_empty() {
            field.clear();
            in_quotes = true;
        } else if c == delimiter {
            record.push(finish_field(&mut field));
        } else if c == '\n' || c == '\r' {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            record.push(finish_field(&mut field));
            records.push(std::mem::take(&mut record));
        } else {
            field.push(c);
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(finish_field(&mut field));
        records.push(record);
    }
    records
}

fn finish_field(field: &mut String) -> String {
    let value = field.trim().to_string();
    field.clear();
    value
}

/// Check if a file path is a data file (CSV/TSV/JSON)
pub fn is_data_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "json"))
        .unwrap_or(false)
}

/// Write a dataset to a delimited text file
pub fn write_csv_file(dataset: &TabularDataset, path: &Path, delimiter: char) -> DataResult<()> {
    std::fs::write(path, write_csv_content(dataset, delimiter))?;
    Ok(())
}

/// Convert a dataset to delimited text, header row first
pub fn write_csv_content(dataset: &TabularDataset, delimiter: char) -> String {
    let separator = delimiter.to_string();
    let mut lines = Vec::with_capacity(dataset.row_count() + 1);

    let headers: Vec<String> = dataset
        .column_names()
        .map(|name| quote_csv_field(name, delimiter))
        .collect();
    lines.push(headers.join(&separator));

    for row in dataset.rows() {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| quote_csv_field(&cell.to_string(), delimiter))
            .collect();
        lines.push(cells.join(&separator));
    }

    lines.join("\n")
}

/// Quote a CSV field if necessary (contains delimiter, quotes, or newlines)
fn quote_csv_field(value: &str, delimiter: char) -> String {
    let needs_quoting = value.contains(delimiter)
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
