use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::FilterError;
use crate::model::PageContent;
use crate::names::NameSet;
use crate::scan::ScanResult;
use crate::warning::ExtractWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Pdf,
    Csv,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenOutput {
    pub kind: OutputKind,
    pub path: PathBuf,
    /// Pages for the PDF, data rows for the CSV, page sections for Markdown.
    pub items: usize,
}

/// What a run did, printed by the CLI and optionally saved as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub total_pages: usize,
    pub scanned_pages: usize,
    /// 0-based indices of the matched pages.
    pub matched_pages: Vec<usize>,
    pub name_column: Option<String>,
    pub name_count: usize,
    pub table_count: usize,
    pub outputs: Vec<WrittenOutput>,
    pub warnings: Vec<ExtractWarning>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub(crate) fn new(source: &Path, scan: &ScanResult, names: Option<&NameSet>) -> Self {
        let table_count = scan
            .matched
            .iter()
            .map(|page| match &page.content {
                PageContent::Tables(tables) => tables.len(),
                _ => 0,
            })
            .sum();

        Self {
            source: source.to_path_buf(),
            generated_at: Utc::now(),
            total_pages: scan.total_pages,
            scanned_pages: scan.scanned_pages,
            matched_pages: scan.match_indices(),
            name_column: names.map(|names| names.column.clone()),
            name_count: names.map_or(0, NameSet::len),
            table_count,
            outputs: Vec::new(),
            warnings: scan.warnings.clone(),
            elapsed_ms: 0,
        }
    }

    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matched_pages.len()
    }

    pub fn write_json(&self, path: &Path) -> Result<(), FilterError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::RunReport;
    use crate::model::{MatchedPage, PageContent};
    use crate::scan::ScanResult;

    fn report() -> RunReport {
        let scan = ScanResult {
            total_pages: 4,
            scanned_pages: 4,
            matched: vec![MatchedPage {
                index: 3,
                page_number: 4,
                content: PageContent::Text("ALICE JONES".to_string()),
            }],
            warnings: Vec::new(),
        };
        RunReport::new(Path::new("processo.pdf"), &scan, None)
    }

    #[test]
    fn summary_is_complete_json() {
        let dir = tempdir().expect("tempdir should be created");
        let path = dir.path().join("summary.json");
        report().write_json(&path).expect("summary should be written");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("summary"))
                .expect("summary should parse");
        assert_eq!(json["matched_pages"], serde_json::json!([3]));
        assert_eq!(json["name_column"], serde_json::Value::Null);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_final_flush_is_an_error() {
        let err = report().write_json(Path::new("/dev/full"));
        assert!(err.is_err(), "{err:?}");
    }
}
