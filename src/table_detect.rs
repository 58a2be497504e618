use crate::model::{DetectedTable, PageText};
use crate::table_parse::{
    has_digit, looks_like_sentence, modal_width, soft_split_line_into_cells, split_line_into_cells,
};

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// Tables found on one page, plus how much of the page they cover.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PageTables {
    pub tables: Vec<DetectedTable>,
    pub table_lines: usize,
    pub text_lines: usize,
}

impl PageTables {
    pub(crate) fn coverage(&self) -> f32 {
        if self.text_lines == 0 {
            return 0.0;
        }
        self.table_lines as f32 / self.text_lines as f32
    }
}

fn table_confidence(rows: &[Vec<String>]) -> f32 {
    let modal = modal_width(rows);
    if rows.is_empty() || modal == 0 {
        return 0.0;
    }

    let consistent =
        rows.iter().filter(|row| row.len() == modal).count() as f32 / rows.len() as f32;
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(modal);
    let min_width = rows.iter().map(Vec::len).min().unwrap_or(modal);
    let uniformity = 1.0 - ((max_width - min_width) as f32 / max_width as f32);

    (consistent * 0.75 + uniformity * 0.25).clamp(0.0, 1.0)
}

/// A candidate table row and whether it came from an explicit column gap
/// (tab or double space) rather than a single-space split.
fn row_cells(line: &str, min_cols: usize) -> Option<(Vec<String>, bool)> {
    let cells = split_line_into_cells(line);
    if cells.len() >= min_cols {
        return Some((cells, true));
    }

    let soft_cells = soft_split_line_into_cells(line);
    if soft_cells.len() >= min_cols && has_digit(&soft_cells) && !looks_like_sentence(line) {
        return Some((soft_cells, false));
    }

    None
}

#[derive(Default)]
struct Run {
    rows: Vec<Vec<String>>,
    explicit: bool,
}

impl Run {
    fn push(&mut self, cells: Vec<String>, explicit: bool) {
        if self.rows.is_empty() {
            self.explicit = explicit;
        }
        self.rows.push(cells);
    }

    /// Multi-row runs are always tables. A lone row only counts when its
    /// columns were separated explicitly; a lone soft split is just prose.
    fn flush(&mut self, page: u32, out: &mut PageTables) {
        let rows = std::mem::take(&mut self.rows);
        if rows.len() >= 2 || (rows.len() == 1 && self.explicit) {
            out.table_lines += rows.len();
            out.tables.push(DetectedTable {
                page,
                confidence: table_confidence(&rows),
                rows,
            });
        }
        self.explicit = false;
    }
}

pub(crate) fn detect_tables_in_page(page: &PageText, min_cols: usize) -> PageTables {
    let mut out = PageTables {
        tables: Vec::new(),
        table_lines: 0,
        text_lines: 0,
    };
    let mut run = Run::default();

    for line in page.text.lines() {
        if line.trim().is_empty() {
            run.flush(page.page_number, &mut out);
            continue;
        }

        out.text_lines += 1;
        match row_cells(line, min_cols.max(2)) {
            Some((cells, explicit)) => run.push(cells, explicit),
            None => run.flush(page.page_number, &mut out),
        }
    }
    run.flush(page.page_number, &mut out);

    out
}
