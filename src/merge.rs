use std::collections::HashMap;

use crate::model::{MatchedPage, MergedOutput, PageContent};
use crate::options::FilterOptions;

pub const CONTENT_COLUMN: &str = "Content";
pub const NO_CONTENT_TEXT: &str = "No content extracted";

/// Column union in order of first appearance, the way a concat of frames
/// with different columns lines them up.
#[derive(Default)]
struct Schema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Schema {
    fn position(&mut self, name: &str) -> usize {
        if let Some(&position) = self.positions.get(name) {
            return position;
        }
        let position = self.columns.len();
        self.columns.push(name.to_string());
        self.positions.insert(name.to_string(), position);
        position
    }
}

struct SparseRow {
    page: u32,
    table_id: Option<usize>,
    cells: Vec<(usize, String)>,
}

/// Flattens the matched pages into one rectangular table for CSV output.
///
/// Table rows land under their own headers; text pages contribute one row
/// per non-empty line under [`CONTENT_COLUMN`]; empty pages contribute a
/// single placeholder row.
pub(crate) fn merge_pages(pages: &[MatchedPage], options: &FilterOptions) -> MergedOutput {
    let mut schema = Schema::default();
    let mut sparse = Vec::new();
    let mut table_count = 0_usize;

    for page in pages {
        match &page.content {
            PageContent::Tables(tables) => {
                for table in tables {
                    table_count += 1;
                    let positions = table
                        .headers
                        .iter()
                        .map(|header| schema.position(header))
                        .collect::<Vec<_>>();
                    for row in &table.rows {
                        sparse.push(SparseRow {
                            page: page.page_number,
                            table_id: Some(table_count),
                            cells: positions.iter().copied().zip(row.iter().cloned()).collect(),
                        });
                    }
                }
            }
            PageContent::Text(text) => {
                let position = schema.position(CONTENT_COLUMN);
                for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
                    sparse.push(SparseRow {
                        page: page.page_number,
                        table_id: None,
                        cells: vec![(position, line.to_string())],
                    });
                }
            }
            PageContent::Empty => {
                let position = schema.position(CONTENT_COLUMN);
                sparse.push(SparseRow {
                    page: page.page_number,
                    table_id: None,
                    cells: vec![(position, NO_CONTENT_TEXT.to_string())],
                });
            }
        }
    }

    let mut headers = Vec::new();
    if options.include_page_column {
        headers.push("page".to_string());
    }
    if options.include_table_column {
        headers.push("table_id".to_string());
    }
    let offset = headers.len();
    headers.extend(schema.columns.iter().cloned());

    let rows = sparse
        .into_iter()
        .map(|sparse_row| {
            let mut row = vec![String::new(); headers.len()];
            if options.include_page_column {
                row[0] = sparse_row.page.to_string();
            }
            if options.include_table_column {
                row[offset - 1] = sparse_row.table_id.map(|id| id.to_string()).unwrap_or_default();
            }
            for (position, value) in sparse_row.cells {
                row[offset + position] = value;
            }
            row
        })
        .collect::<Vec<_>>();

    MergedOutput {
        headers,
        row_count: rows.len(),
        table_count,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::merge_pages;
    use crate::model::{MatchedPage, PageContent, Table};
    use crate::options::FilterOptions;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|cell| (*cell).to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        }
    }

    fn matched(page_number: u32, content: PageContent) -> MatchedPage {
        MatchedPage {
            index: page_number as usize - 1,
            page_number,
            content,
        }
    }

    #[test]
    fn unions_columns_in_first_appearance_order() {
        let pages = vec![
            matched(1, PageContent::Tables(vec![table(&["Nome", "Valor"], &[&["Ana", "10"]])])),
            matched(4, PageContent::Tables(vec![table(&["CPF", "Nome"], &[&["123", "Bia"]])])),
        ];
        let merged = merge_pages(&pages, &FilterOptions::default());
        assert_eq!(merged.headers, vec!["Nome", "Valor", "CPF"]);
        assert_eq!(merged.rows, vec![vec!["Ana", "10", ""], vec!["Bia", "", "123"]]);
        assert_eq!(merged.table_count, 2);
        assert_eq!(merged.row_count, 2);
    }

    #[test]
    fn text_and_empty_pages_use_content_column() {
        let pages = vec![
            matched(2, PageContent::Text("linha um\n\nlinha dois".to_string())),
            matched(3, PageContent::Empty),
        ];
        let merged = merge_pages(&pages, &FilterOptions::default());
        assert_eq!(merged.headers, vec!["Content"]);
        assert_eq!(
            merged.rows,
            vec![vec!["linha um"], vec!["linha dois"], vec!["No content extracted"]]
        );
    }

    #[test]
    fn optional_page_and_table_columns_lead() {
        let pages = vec![
            matched(5, PageContent::Tables(vec![table(&["Nome"], &[&["Ana"]])])),
            matched(6, PageContent::Text("texto".to_string())),
        ];
        let options = FilterOptions {
            include_page_column: true,
            include_table_column: true,
            ..FilterOptions::default()
        };
        let merged = merge_pages(&pages, &options);
        assert_eq!(merged.headers, vec!["page", "table_id", "Nome", "Content"]);
        assert_eq!(merged.rows[0], vec!["5", "1", "Ana", ""]);
        assert_eq!(merged.rows[1], vec!["6", "", "", "texto"]);
    }
}
