//! Per-page content extraction as an ordered list of strategies.
//!
//! Each strategy either produces [`PageContent`] or declines; the first one
//! that produces something wins. The placeholder strategy never declines, so
//! a matched page always ends up in the report.

use tracing::debug;

use crate::header::build_table;
use crate::model::{PageContent, PageText};
use crate::options::{ContentMode, FilterOptions, QualityMode};
use crate::table_detect::{LOW_CONFIDENCE_THRESHOLD, detect_tables_in_page};
use crate::warning::{ExtractWarning, WarningCode};

/// Running state shared by the strategies during one scan.
pub(crate) struct ExtractContext<'a> {
    pub options: &'a FilterOptions,
    pub warnings: &'a mut Vec<ExtractWarning>,
    pub next_table_id: &'a mut usize,
}

pub(crate) trait ContentStrategy {
    fn name(&self) -> &'static str;

    fn extract(&self, page: &PageText, context: &mut ExtractContext<'_>) -> Option<PageContent>;
}

pub(crate) struct TableGrid;

impl ContentStrategy for TableGrid {
    fn name(&self) -> &'static str {
        "table-grid"
    }

    fn extract(&self, page: &PageText, context: &mut ExtractContext<'_>) -> Option<PageContent> {
        let options = context.options;
        let found = detect_tables_in_page(page, options.min_cols);
        if found.tables.is_empty() || found.coverage() < options.min_table_coverage {
            return None;
        }

        let mut tables = Vec::new();
        for detected in found.tables {
            let table_id = *context.next_table_id;
            if detected.confidence < LOW_CONFIDENCE_THRESHOLD {
                match options.quality_mode {
                    QualityMode::BestEffort => context.warnings.push(
                        ExtractWarning::new(
                            WarningCode::LowConfidence,
                            "table confidence is low; exported in best-effort mode",
                        )
                        .with_page(page.page_number)
                        .with_table_id(table_id)
                        .with_confidence(detected.confidence),
                    ),
                    QualityMode::SkipAmbiguous => {
                        context.warnings.push(
                            ExtractWarning::new(
                                WarningCode::LowConfidence,
                                "skipping low-confidence table",
                            )
                            .with_page(page.page_number)
                            .with_confidence(detected.confidence),
                        );
                        continue;
                    }
                }
            }

            if let Some(table) =
                build_table(&detected, options.header_mode, context.warnings, table_id)
            {
                *context.next_table_id += 1;
                tables.push(table);
            }
        }

        if tables.is_empty() {
            context.warnings.push(
                ExtractWarning::new(
                    WarningCode::TextFallback,
                    "no table survived on this page; exporting its text",
                )
                .with_page(page.page_number),
            );
            return None;
        }
        Some(PageContent::Tables(tables))
    }
}

pub(crate) struct RawText;

impl ContentStrategy for RawText {
    fn name(&self) -> &'static str {
        "raw-text"
    }

    fn extract(&self, page: &PageText, _context: &mut ExtractContext<'_>) -> Option<PageContent> {
        let text = page.text.trim();
        (!text.is_empty()).then(|| PageContent::Text(text.to_string()))
    }
}

pub(crate) struct Placeholder;

impl ContentStrategy for Placeholder {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn extract(&self, page: &PageText, context: &mut ExtractContext<'_>) -> Option<PageContent> {
        context.warnings.push(
            ExtractWarning::new(WarningCode::NoContent, "matched page has no extractable content")
                .with_page(page.page_number),
        );
        Some(PageContent::Empty)
    }
}

pub(crate) fn strategies_for(mode: ContentMode) -> Vec<Box<dyn ContentStrategy>> {
    match mode {
        ContentMode::TablesThenText => {
            vec![Box::new(TableGrid), Box::new(RawText), Box::new(Placeholder)]
        }
        ContentMode::TextOnly => vec![Box::new(RawText), Box::new(Placeholder)],
    }
}

pub(crate) fn extract_page_content(
    page: &PageText,
    strategies: &[Box<dyn ContentStrategy>],
    context: &mut ExtractContext<'_>,
) -> PageContent {
    for strategy in strategies {
        if let Some(content) = strategy.extract(page, context) {
            debug!(page = page.page_number, strategy = strategy.name(), "page content extracted");
            return content;
        }
    }
    PageContent::Empty
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ExtractContext, extract_page_content, strategies_for};
    use crate::model::{PageContent, PageText, Table};
    use crate::options::{ContentMode, FilterOptions, QualityMode};
    use crate::warning::WarningCode;

    fn run(text: &str, options: &FilterOptions) -> (PageContent, Vec<WarningCode>) {
        let page = PageText {
            page_number: 2,
            text: text.to_string(),
        };
        let mut warnings = Vec::new();
        let mut next_table_id = 1;
        let mut context = ExtractContext {
            options,
            warnings: &mut warnings,
            next_table_id: &mut next_table_id,
        };
        let strategies = strategies_for(options.content_mode);
        let content = extract_page_content(&page, &strategies, &mut context);
        (content, warnings.into_iter().map(|warning| warning.code).collect())
    }

    #[test]
    fn table_page_yields_tables() {
        let text = "Nome  Valor\nAna Souza  100\nBia Reis  200";
        let (content, _) = run(text, &FilterOptions::default());
        assert_eq!(
            content,
            PageContent::Tables(vec![Table {
                headers: vec!["Nome".to_string(), "Valor".to_string()],
                rows: vec![
                    vec!["Ana Souza".to_string(), "100".to_string()],
                    vec!["Bia Reis".to_string(), "200".to_string()],
                ],
            }])
        );
    }

    #[test]
    fn prose_page_falls_back_to_text() {
        let text = "  Vistos.\nALICE JONES requer habilitação.\n";
        let (content, _) = run(text, &FilterOptions::default());
        assert_eq!(
            content,
            PageContent::Text("Vistos.\nALICE JONES requer habilitação.".to_string())
        );
    }

    #[test]
    fn small_table_inside_prose_stays_text() {
        let text = "Vistos.\nFls.  12\nO credor ALICE JONES requer habilitação.\nIntime-se.";
        let (content, _) = run(text, &FilterOptions::default());
        assert!(matches!(content, PageContent::Text(_)));
    }

    #[test]
    fn blank_page_gets_placeholder() {
        let (content, warnings) = run("  \n ", &FilterOptions::default());
        assert_eq!(content, PageContent::Empty);
        assert_eq!(warnings, vec![WarningCode::NoContent]);
    }

    #[test]
    fn skipped_ambiguous_tables_fall_back_to_text() {
        let options = FilterOptions {
            quality_mode: QualityMode::SkipAmbiguous,
            ..FilterOptions::default()
        };
        let (content, warnings) = run("A  B  C\n1  2\n3  4  5  6\n7  8", &options);
        assert!(matches!(content, PageContent::Text(_)));
        assert_eq!(warnings, vec![WarningCode::LowConfidence, WarningCode::TextFallback]);
    }

    #[test]
    fn text_only_mode_skips_table_detection() {
        let options = FilterOptions {
            content_mode: ContentMode::TextOnly,
            ..FilterOptions::default()
        };
        let (content, _) = run("Nome  Valor\nAna  100", &options);
        assert_eq!(content, PageContent::Text("Nome  Valor\nAna  100".to_string()));
    }
}
