use std::collections::{HashMap, HashSet};

use crate::model::{DetectedTable, Table};
use crate::options::HeaderMode;
use crate::table_parse::pad_row;
use crate::warning::{ExtractWarning, WarningCode};

pub const UNNAMED_HEADER: &str = "Unnamed";

const HEADER_CONFIDENCE_THRESHOLD: f32 = 0.55;

/// Turns raw header cells into unique column names.
///
/// Cells are trimmed and blanks become [`UNNAMED_HEADER`]. The first
/// occurrence of a name is kept as is; later ones get `_1`, `_2`, ... in
/// order of appearance. The counter skips suffixes that are already taken,
/// so `["a_1", "a", "a"]` yields `["a_1", "a", "a_2"]`.
#[must_use]
pub fn dedupe_headers<S: AsRef<str>>(cells: &[S]) -> Vec<String> {
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(cells.len());

    for cell in cells {
        let base = match cell.as_ref().trim() {
            "" => UNNAMED_HEADER.to_string(),
            name => name.to_string(),
        };

        let name = if used.contains(&base) {
            let counter = counters.entry(base.clone()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{base}_{counter}");
                if !used.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base
        };

        used.insert(name.clone());
        headers.push(name);
    }

    headers
}

#[must_use]
pub fn positional_headers(width: usize) -> Vec<String> {
    (1..=width).map(|index| format!("col_{index}")).collect()
}

fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim().replace(['.', ','], "");
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

fn non_numeric_ratio(cells: &[String]) -> f32 {
    if cells.is_empty() {
        return 0.0;
    }

    let non_numeric = cells.iter().filter(|cell| !is_numeric(cell)).count();
    non_numeric as f32 / cells.len() as f32
}

pub(crate) fn infer_has_header(rows: &[Vec<String>]) -> (bool, f32) {
    let Some(first) = rows.first() else {
        return (false, 0.0);
    };

    let first = non_numeric_ratio(first);
    let second = rows.get(1).map_or(0.0, |row| non_numeric_ratio(row));

    let confidence = (first * 0.6 + (1.0 - second) * 0.4).clamp(0.0, 1.0);
    let has_header = first >= 0.6 && second <= 0.7;
    (has_header, confidence)
}

fn with_positional_headers(rows: &[Vec<String>], width: usize) -> Table {
    Table {
        headers: positional_headers(width),
        rows: rows.iter().map(|row| pad_row(row, width)).collect(),
    }
}

fn with_first_row_header(rows: &[Vec<String>], width: usize) -> Table {
    Table {
        headers: dedupe_headers(pad_row(&rows[0], width).as_slice()),
        rows: rows[1..].iter().map(|row| pad_row(row, width)).collect(),
    }
}

/// Builds a [`Table`] from a detected grid.
///
/// A grid with a single row is always kept as one data row under
/// positional headers, whatever the header mode: it cannot be told apart
/// from a lone header, and emitting it as data keeps its text visible.
pub(crate) fn build_table(
    table: &DetectedTable,
    mode: HeaderMode,
    warnings: &mut Vec<ExtractWarning>,
    table_id: usize,
) -> Option<Table> {
    let width = table.rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return None;
    }

    if table.rows.len() == 1 {
        return Some(with_positional_headers(&table.rows, width));
    }

    let built = match mode {
        HeaderMode::HasHeader => with_first_row_header(&table.rows, width),
        HeaderMode::NoHeader => with_positional_headers(&table.rows, width),
        HeaderMode::AutoDetect => {
            let (has_header, confidence) = infer_has_header(&table.rows);
            if has_header && confidence >= HEADER_CONFIDENCE_THRESHOLD {
                with_first_row_header(&table.rows, width)
            } else {
                if confidence < HEADER_CONFIDENCE_THRESHOLD {
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::HeaderInferenceLowConfidence,
                            "header inference confidence is low; keeping the first row as data",
                        )
                        .with_page(table.page)
                        .with_table_id(table_id)
                        .with_confidence(confidence),
                    );
                }
                with_positional_headers(&table.rows, width)
            }
        }
    };

    Some(built)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{build_table, dedupe_headers, infer_has_header};
    use crate::model::DetectedTable;
    use crate::options::HeaderMode;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| (*cell).to_string()).collect()
    }

    #[test]
    fn suffixes_repeated_headers_in_order() {
        let headers = dedupe_headers(&["Nome", "Valor", "Nome", " Nome ", "Valor"]);
        assert_eq!(headers, vec!["Nome", "Valor", "Nome_1", "Nome_2", "Valor_1"]);
    }

    #[test]
    fn blank_headers_become_unnamed() {
        let headers = dedupe_headers(&["", "  ", "CPF"]);
        assert_eq!(headers, vec!["Unnamed", "Unnamed_1", "CPF"]);
    }

    #[test]
    fn suffix_never_collides_with_existing_name() {
        let headers = dedupe_headers(&["a_1", "a", "a"]);
        assert_eq!(headers, vec!["a_1", "a", "a_2"]);
    }

    #[test]
    fn dedupe_is_deterministic() {
        let cells = ["x", "", "x", "y", "", "x"];
        assert_eq!(dedupe_headers(&cells), dedupe_headers(&cells));
    }

    #[test]
    fn infers_headers_for_text_then_numeric_rows() {
        let rows = vec![strings(&["Nome", "Valor"]), strings(&["Ana", "1.500,00"])];
        let (has_header, confidence) = infer_has_header(&rows);
        assert!(has_header);
        assert!(confidence > 0.5);
    }

    #[test]
    fn pads_ragged_rows_and_header() {
        let detected = DetectedTable {
            page: 1,
            rows: vec![strings(&["Nome", "Nome"]), strings(&["Ana", "B", "extra"])],
            confidence: 0.8,
        };
        let table = build_table(&detected, HeaderMode::HasHeader, &mut Vec::new(), 1)
            .expect("table should build");
        assert_eq!(table.headers, vec!["Nome", "Nome_1", "Unnamed"]);
        assert_eq!(table.rows, vec![strings(&["Ana", "B", "extra"])]);
    }

    #[test]
    fn single_row_grid_is_data_under_positional_headers() {
        let detected = DetectedTable {
            page: 1,
            rows: vec![strings(&["Nome", "CPF", "Valor"])],
            confidence: 1.0,
        };
        let table = build_table(&detected, HeaderMode::HasHeader, &mut Vec::new(), 1)
            .expect("table should build");
        assert_eq!(table.headers, vec!["col_1", "col_2", "col_3"]);
        assert_eq!(table.rows, vec![strings(&["Nome", "CPF", "Valor"])]);
    }
}
