use std::fmt::Write as _;
use std::path::Path;

use crate::error::FilterError;
use crate::model::{MatchedPage, PageContent, Table};

pub const NO_CONTENT_MARKDOWN: &str = "*No content extracted*";

/// How `## Page N` headings are numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumbering {
    /// Position in the filtered output, `1..=k`, matching the derivative PDF.
    /// The source page number follows the heading.
    Filtered,
    /// Page number in the source document.
    Source,
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a String>) {
    out.push('|');
    for cell in cells {
        let _ = write!(out, " {} |", escape_cell(cell));
    }
    out.push('\n');
}

/// GitHub-flavored Markdown table with one header row.
pub(crate) fn render_table(table: &Table) -> String {
    let mut out = String::new();
    push_row(&mut out, table.headers.iter());
    out.push('|');
    for _ in &table.headers {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in &table.rows {
        push_row(&mut out, row.iter());
    }
    out
}

/// Renders the report: a title, then one `## Page N` section per matched
/// page holding its tables, its raw text or a placeholder.
pub fn render_markdown(title: &str, pages: &[MatchedPage], numbering: PageNumbering) -> String {
    let mut out = format!("# {title}\n\n");
    for (position, page) in pages.iter().enumerate() {
        match numbering {
            PageNumbering::Filtered => {
                let _ = write!(
                    out,
                    "## Page {}\n\n*Source page {}*\n\n",
                    position + 1,
                    page.page_number
                );
            }
            PageNumbering::Source => {
                let _ = write!(out, "## Page {}\n\n", page.page_number);
            }
        }
        match &page.content {
            PageContent::Tables(tables) => {
                for table in tables {
                    out.push_str(&render_table(table));
                    out.push('\n');
                }
            }
            PageContent::Text(text) => {
                out.push_str(text);
                out.push_str("\n\n");
            }
            PageContent::Empty => {
                out.push_str(NO_CONTENT_MARKDOWN);
                out.push_str("\n\n");
            }
        }
    }
    out
}

pub(crate) fn write_markdown(
    path: &Path,
    title: &str,
    pages: &[MatchedPage],
    numbering: PageNumbering,
) -> Result<(), FilterError> {
    std::fs::write(path, render_markdown(title, pages, numbering))?;
    Ok(())
}
