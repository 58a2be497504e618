mod config;
mod content;
mod csv_out;
mod error;
mod header;
mod markdown_out;
mod matcher;
mod merge;
mod model;
mod names;
mod options;
mod pdf_reader;
mod report;
mod scan;
mod table_detect;
mod table_parse;
mod warning;

use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::{FILTERED_SUFFIX, ensure_exists};
use crate::csv_out::{write_csv, write_csv_to_string};
use crate::markdown_out::write_markdown;
use crate::merge::merge_pages;

pub use config::{NamesSource, OutputConfig, RunConfig};
pub use error::FilterError;
pub use header::{dedupe_headers, positional_headers};
pub use markdown_out::{PageNumbering, render_markdown};
pub use matcher::{AllPages, NameMatcher, PageMatcher};
pub use merge::{CONTENT_COLUMN, NO_CONTENT_TEXT};
pub use model::{MatchedPage, PageContent, PageText, Table};
pub use names::{NameSet, Sheet, SheetPreview, inspect_spreadsheet, load_names, read_sheet};
pub use options::{ContentMode, FilterOptions, HeaderMode, PageSelection, QualityMode};
pub use pdf_reader::PdfSource;
pub use report::{OutputKind, RunReport, WrittenOutput};
pub use scan::{ScanResult, scan_document};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

/// Renders the matched pages as the merged CSV table, BOM included.
pub fn render_csv(scan: &ScanResult, options: &FilterOptions) -> Result<String, FilterError> {
    write_csv_to_string(&merge_pages(&scan.matched, options), options.delimiter)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Filter,
    Convert,
}

impl RunKind {
    fn suffix(self) -> &'static str {
        match self {
            Self::Filter => FILTERED_SUFFIX,
            Self::Convert => "",
        }
    }

    fn numbering(self) -> PageNumbering {
        match self {
            Self::Filter => PageNumbering::Filtered,
            Self::Convert => PageNumbering::Source,
        }
    }
}

fn write_outputs(
    source: &PdfSource,
    source_path: &Path,
    scan: &ScanResult,
    output: &OutputConfig,
    options: &FilterOptions,
    kind: RunKind,
) -> Result<Vec<WrittenOutput>, FilterError> {
    let mut written = Vec::new();
    let with_pdf = kind == RunKind::Filter && output.write_pdf;
    if !with_pdf && !output.write_csv && !output.write_markdown {
        return Ok(written);
    }
    std::fs::create_dir_all(&output.dir)?;
    let suffix = kind.suffix();

    if with_pdf {
        let path = output.resolve(output.pdf_path.as_ref(), source_path, suffix, "pdf");
        let pages = source.write_subset(&scan.match_indices(), &path)?;
        info!(pages, "saved filtered PDF to {}", path.display());
        written.push(WrittenOutput {
            kind: OutputKind::Pdf,
            path,
            items: pages,
        });
    }

    if output.write_csv {
        let path = output.resolve(output.csv_path.as_ref(), source_path, suffix, "csv");
        let merged = merge_pages(&scan.matched, options);
        write_csv(&path, &merged, options.delimiter)?;
        info!(rows = merged.row_count, "saved CSV to {}", path.display());
        written.push(WrittenOutput {
            kind: OutputKind::Csv,
            path,
            items: merged.row_count,
        });
    }

    if output.write_markdown {
        let path = output.resolve(output.markdown_path.as_ref(), source_path, suffix, "md");
        write_markdown(&path, &options.markdown_title, &scan.matched, kind.numbering())?;
        info!("saved Markdown to {}", path.display());
        written.push(WrittenOutput {
            kind: OutputKind::Markdown,
            path,
            items: scan.matched.len(),
        });
    }

    Ok(written)
}

fn finish_report(
    mut report: RunReport,
    started: Instant,
    output: &OutputConfig,
) -> Result<RunReport, FilterError> {
    report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if let Some(path) = &output.summary_path {
        report.write_json(path)?;
        info!("saved run summary to {}", path.display());
    }
    Ok(report)
}

/// Keeps the pages of `config.pdf` that mention any configured name and
/// writes the selected outputs.
///
/// Missing inputs, an unreadable document, a missing name column and an
/// empty name list are errors. Zero matching pages is not: the report
/// says so and no output file is written.
pub fn filter_document(config: &RunConfig) -> Result<RunReport, FilterError> {
    let started = Instant::now();
    config.options.validate().map_err(FilterError::InvalidOption)?;
    ensure_exists(&config.pdf)?;
    config.names.check_exists()?;

    info!("loading names");
    let names = config.names.load()?;
    let matcher = NameMatcher::new(&names);

    info!("processing PDF {}", config.pdf.display());
    let source = PdfSource::open(&config.pdf)?;
    let scan = scan_document(&source, &matcher, &config.options);
    let mut report = RunReport::new(&config.pdf, &scan, Some(&names));

    if scan.is_empty() {
        warn!("no page contains any of the {} names", names.len());
    } else {
        report.outputs = write_outputs(
            &source,
            &config.pdf,
            &scan,
            &config.output,
            &config.options,
            RunKind::Filter,
        )?;
    }

    finish_report(report, started, &config.output)
}

/// Extracts every (selected) page of a PDF to CSV and/or Markdown without
/// name filtering. The PDF output flag is ignored.
pub fn convert_document(
    pdf: &Path,
    output: &OutputConfig,
    options: &FilterOptions,
) -> Result<RunReport, FilterError> {
    let started = Instant::now();
    options.validate().map_err(FilterError::InvalidOption)?;

    let source = PdfSource::open(pdf)?;
    let scan = scan_document(&source, &AllPages, options);
    let mut report = RunReport::new(pdf, &scan, None);
    if scan.is_empty() {
        warn!("no pages selected for conversion");
    } else {
        report.outputs = write_outputs(&source, pdf, &scan, output, options, RunKind::Convert)?;
    }

    finish_report(report, started, output)
}
