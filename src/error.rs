use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("failed to write JSON summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("unsupported spreadsheet format: {}", .0.display())]
    UnsupportedSpreadsheet(PathBuf),

    #[error("name column not found; available columns: {columns:?}")]
    NameColumnNotFound { columns: Vec<String> },

    #[error("no usable names (longer than 3 characters) in column '{column}'")]
    EmptyNameSet { column: String },

    #[error("failed to extract text from page {page}: {reason}")]
    PageExtract { page: u32, reason: String },

    #[error("page index {index} is out of range (document has {page_count} pages)")]
    PageOutOfRange { index: usize, page_count: usize },

    #[error("invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}
