use std::collections::HashMap;

/// Splits a text line into cells on tabs or on runs of two or more spaces.
/// Single spaces stay inside a cell, so "Maria da Silva  123" has two cells.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    fn push_cell(current: &mut String, cells: &mut Vec<String>) {
        let cell = current.trim();
        if !cell.is_empty() {
            cells.push(cell.to_string());
        }
        current.clear();
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut pending_spaces = 0_usize;

    for ch in line.trim().chars() {
        match ch {
            '\t' => {
                pending_spaces = 0;
                push_cell(&mut current, &mut cells);
            }
            ch if ch.is_whitespace() => pending_spaces += 1,
            ch => {
                if pending_spaces >= 2 {
                    push_cell(&mut current, &mut cells);
                } else if pending_spaces == 1 {
                    current.push(' ');
                }
                pending_spaces = 0;
                current.push(ch);
            }
        }
    }
    push_cell(&mut current, &mut cells);

    cells
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

pub(crate) fn looks_like_sentence(line: &str) -> bool {
    line.trim_end().ends_with(['.', '!', '?', ':', ';'])
}

pub(crate) fn has_digit(cells: &[String]) -> bool {
    cells
        .iter()
        .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit()))
}

pub(crate) fn pad_row(row: &[String], width: usize) -> Vec<String> {
    let mut out = row.to_vec();
    out.resize(width, String::new());
    out
}

pub(crate) fn modal_width(rows: &[Vec<String>]) -> usize {
    let mut freq = HashMap::new();
    for width in rows.iter().map(Vec::len) {
        *freq.entry(width).or_insert(0_usize) += 1;
    }

    freq.into_iter()
        .max_by_key(|(width, count)| (*count, *width))
        .map_or(0, |(width, _)| width)
}

#[cfg(test)]
mod tests {
    use super::{
        looks_like_sentence, modal_width, pad_row, soft_split_line_into_cells,
        split_line_into_cells,
    };

    #[test]
    fn splits_double_space_separated_cells() {
        let cells = split_line_into_cells("Maria da Silva   123.456-7  R$ 1.000,00");
        assert_eq!(cells, vec!["Maria da Silva", "123.456-7", "R$ 1.000,00"]);
    }

    #[test]
    fn splits_tab_separated_cells() {
        let cells = split_line_into_cells("A\tB\t\tC");
        assert_eq!(cells, vec!["A", "B", "C"]);
    }

    #[test]
    fn blank_line_has_no_cells() {
        assert!(split_line_into_cells("   ").is_empty());
    }

    #[test]
    fn soft_splits_single_space_cells() {
        let cells = soft_split_line_into_cells("Credor 12 30");
        assert_eq!(cells, vec!["Credor", "12", "30"]);
    }

    #[test]
    fn recognises_sentence_endings() {
        assert!(looks_like_sentence("Intime-se o credor."));
        assert!(!looks_like_sentence("Total 3 4"));
    }

    #[test]
    fn pads_short_rows() {
        let row = vec!["a".to_string()];
        assert_eq!(pad_row(&row, 3), vec!["a", "", ""]);
    }

    #[test]
    fn detects_modal_width() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
            vec!["x".to_string()],
        ];
        assert_eq!(modal_width(&rows), 2);
    }
}
