use tracing::{info, warn};

use crate::content::{ExtractContext, extract_page_content, strategies_for};
use crate::matcher::PageMatcher;
use crate::model::MatchedPage;
use crate::options::FilterOptions;
use crate::pdf_reader::PdfSource;
use crate::warning::{ExtractWarning, WarningCode};

/// Outcome of one pass over a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub total_pages: usize,
    pub scanned_pages: usize,
    pub matched: Vec<MatchedPage>,
    pub warnings: Vec<ExtractWarning>,
}

impl ScanResult {
    /// 0-based indices of the matched pages, in document order.
    #[must_use]
    pub fn match_indices(&self) -> Vec<usize> {
        self.matched.iter().map(|page| page.index).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

/// Accumulator threaded through the scan loop.
struct ScanBuilder {
    total_pages: usize,
    scanned_pages: usize,
    matched: Vec<MatchedPage>,
    warnings: Vec<ExtractWarning>,
    next_table_id: usize,
}

impl ScanBuilder {
    fn new(total_pages: usize) -> Self {
        Self {
            total_pages,
            scanned_pages: 0,
            matched: Vec::new(),
            warnings: Vec::new(),
            next_table_id: 1,
        }
    }

    fn finish(self) -> ScanResult {
        ScanResult {
            total_pages: self.total_pages,
            scanned_pages: self.scanned_pages,
            matched: self.matched,
            warnings: self.warnings,
        }
    }
}

/// Scans every selected page once, in order, and extracts the content of
/// the pages accepted by `matcher`. A page whose text cannot be read is
/// recorded as a warning and skipped; the scan itself never fails.
pub fn scan_document(
    source: &PdfSource,
    matcher: &dyn PageMatcher,
    options: &FilterOptions,
) -> ScanResult {
    let total_pages = source.page_count();
    let strategies = strategies_for(options.content_mode);
    let mut builder = ScanBuilder::new(total_pages);

    info!(total_pages, "scanning document");

    for index in 0..total_pages {
        let page_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if options
            .pages
            .as_ref()
            .is_some_and(|selection| !selection.contains(page_number))
        {
            continue;
        }

        builder.scanned_pages += 1;
        if options.progress_every > 0 && (index + 1) % options.progress_every == 0 {
            info!("page {}/{}...", index + 1, total_pages);
        }

        let page = match source.page_text(index) {
            Ok(page) => page,
            Err(error) => {
                warn!(page = page_number, %error, "skipping unreadable page");
                builder.warnings.push(
                    ExtractWarning::new(WarningCode::PageExtractFailed, error.to_string())
                        .with_page(page_number),
                );
                continue;
            }
        };

        if !matcher.matches(&page.text) {
            continue;
        }

        let mut context = ExtractContext {
            options,
            warnings: &mut builder.warnings,
            next_table_id: &mut builder.next_table_id,
        };
        let content = extract_page_content(&page, &strategies, &mut context);
        builder.matched.push(MatchedPage {
            index,
            page_number: page.page_number,
            content,
        });
    }

    let result = builder.finish();
    info!(
        matched = result.matched.len(),
        scanned = result.scanned_pages,
        "scan finished"
    );
    result
}
