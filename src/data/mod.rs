//! Tabular data: the dataset value, its cells, and import/export
//!
//! [`TabularDataset`] is the immutable columnar value everything else in the
//! crate consumes. The parsers turn CSV/TSV, clipboard and JSON text into
//! datasets with inferred column types; the writers go the other way.
//!
//! ## Error Handling
//!
//! All data operations return `DataResult<T>` which uses the `DataError` type.
//! Common errors include:
//! - `InvalidName`: duplicate or empty column name on add/rename
//! - `OutOfRange`: row position outside the dataset
//! - `TooLarge` / `TooManyRows`: import exceeds size limits
//! - `Io`, `Csv`/`Json`: file system and parse errors

mod cell;
mod csv_parser;
mod dataset;
mod error;
mod infer;
mod json_parser;
pub mod samples;

pub use cell::*;
pub(crate) use cell::CellKey;
pub use csv_parser::*;
pub use dataset::*;
pub use error::*;
pub use json_parser::*;

use std::path::Path;

/// Load a CSV, TSV or JSON file, picking the parser by extension
pub fn load_data_file(path: &Path, max_rows: usize) -> DataResult<TabularDataset> {
    if !is_data_file(path) {
        return Err(DataError::InvalidData(format!(
            "unsupported file type: {}",
            path.display()
        )));
    }
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        parse_json_file(path)
    } else {
        parse_csv_file_with_limit(path, max_rows)
    }
}
