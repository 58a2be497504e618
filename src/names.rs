//! Loading the search vocabulary from a spreadsheet column.
//!
//! The column is picked by name: `NOME_QGC` if present, otherwise the first
//! header containing "nome" (any case). Excel/ODS workbooks are read with
//! `calamine` (first worksheet, first row as header); `.csv` files with `csv`.

use std::collections::BTreeSet;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::{debug, info};

use crate::error::FilterError;

pub const PREFERRED_NAME_COLUMN: &str = "NOME_QGC";
pub const NAME_COLUMN_HINT: &str = "nome";
pub const MIN_NAME_CHARS: usize = 4;
pub const PREVIEW_ROWS: usize = 5;

/// A header row plus data rows, all as display strings. Blank cells are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Distinct, trimmed search strings and the column they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSet {
    pub column: String,
    names: BTreeSet<String>,
}

impl NameSet {
    /// Builds a set from arbitrary strings with the same trimming and length
    /// filter as the spreadsheet path.
    pub fn from_names<I, S>(column: impl Into<String>, names: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let column = column.into();
        let names = names
            .into_iter()
            .filter_map(|name| clean_name(name.as_ref()))
            .collect::<BTreeSet<_>>();
        if names.is_empty() {
            return Err(FilterError::EmptyNameSet { column });
        }
        Ok(Self { column, names })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

fn clean_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (trimmed.chars().count() >= MIN_NAME_CHARS).then(|| trimmed.to_string())
}

/// Picks the name column: an explicit override must match exactly,
/// then `NOME_QGC`, then the first header containing "nome".
pub fn select_name_column(
    columns: &[String],
    explicit: Option<&str>,
) -> Result<usize, FilterError> {
    let not_found = || FilterError::NameColumnNotFound {
        columns: columns.to_vec(),
    };

    if let Some(wanted) = explicit {
        return columns
            .iter()
            .position(|column| column == wanted)
            .ok_or_else(not_found);
    }

    columns
        .iter()
        .position(|column| column == PREFERRED_NAME_COLUMN)
        .or_else(|| {
            columns
                .iter()
                .position(|column| column.to_lowercase().contains(NAME_COLUMN_HINT))
        })
        .ok_or_else(not_found)
}

impl Sheet {
    pub fn name_set(&self, explicit_column: Option<&str>) -> Result<NameSet, FilterError> {
        let index = select_name_column(&self.columns, explicit_column)?;
        let column = self.columns[index].clone();
        let values = self
            .rows
            .iter()
            .filter_map(|row| row.get(index).cloned().flatten());
        NameSet::from_names(column, values)
    }

    #[must_use]
    pub fn preview(&self) -> SheetPreview {
        SheetPreview {
            columns: self.columns.clone(),
            head: self
                .rows
                .iter()
                .take(PREVIEW_ROWS)
                .map(|row| row.iter().map(|cell| cell.clone().unwrap_or_default()).collect())
                .collect(),
            total_rows: self.rows.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPreview {
    pub columns: Vec<String>,
    pub head: Vec<Vec<String>>,
    pub total_rows: usize,
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            Some(value.clone())
        }
        other => Some(other.to_string()),
    }
}

fn read_workbook(path: &Path) -> Result<Sheet, FilterError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => {
            return Ok(Sheet {
                columns: Vec::new(),
                rows: Vec::new(),
            });
        }
    };

    let mut rows = range.rows();
    let columns = rows
        .next()
        .map(|header| {
            header
                .iter()
                .map(|cell| cell_text(cell).unwrap_or_default().trim().to_string())
                .collect()
        })
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(Sheet { columns, rows })
}

fn read_csv(path: &Path) -> Result<Sheet, FilterError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns = reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{FEFF}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|value| (!value.is_empty()).then(|| value.to_string()))
                .collect(),
        );
    }

    Ok(Sheet { columns, rows })
}

/// Reads the first sheet of a spreadsheet file.
pub fn read_sheet(path: &Path) -> Result<Sheet, FilterError> {
    if !path.exists() {
        return Err(FilterError::MissingInput(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let sheet = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        _ => return Err(FilterError::UnsupportedSpreadsheet(path.to_path_buf())),
    };
    debug!(
        columns = ?sheet.columns,
        rows = sheet.rows.len(),
        "spreadsheet loaded from {}",
        path.display()
    );
    Ok(sheet)
}

pub fn load_names(path: &Path, explicit_column: Option<&str>) -> Result<NameSet, FilterError> {
    let names = read_sheet(path)?.name_set(explicit_column)?;
    info!(column = %names.column, names = names.len(), "names loaded");
    Ok(names)
}

pub fn inspect_spreadsheet(path: &Path) -> Result<SheetPreview, FilterError> {
    Ok(read_sheet(path)?.preview())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{NameSet, Sheet, select_name_column};
    use crate::error::FilterError;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn prefers_exact_nome_qgc_column() {
        let cols = columns(&["Nome Fantasia", "ID", "NOME_QGC"]);
        assert_eq!(select_name_column(&cols, None).expect("column"), 2);
    }

    #[test]
    fn falls_back_to_first_column_containing_nome() {
        let cols = columns(&["ID", "Sobrenome", "NOME"]);
        assert_eq!(select_name_column(&cols, None).expect("column"), 1);
    }

    #[test]
    fn missing_column_lists_available_columns() {
        let cols = columns(&["ID", "CPF"]);
        match select_name_column(&cols, None) {
            Err(FilterError::NameColumnNotFound { columns }) => {
                assert_eq!(columns, vec!["ID", "CPF"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn explicit_column_must_match_exactly() {
        let cols = columns(&["Credor", "NOME_QGC"]);
        assert_eq!(select_name_column(&cols, Some("Credor")).expect("column"), 0);
        assert!(select_name_column(&cols, Some("credor")).is_err());
    }

    #[test]
    fn trims_and_drops_short_or_blank_names() {
        let sheet = Sheet {
            columns: columns(&["ID", "NOME_QGC"]),
            rows: vec![
                vec![Some("1".to_string()), Some("  joao silva  ".to_string())],
                vec![Some("2".to_string()), Some(String::new())],
                vec![Some("3".to_string()), None],
                vec![Some("4".to_string()), Some(" Ana ".to_string())],
            ],
        };
        let names = sheet.name_set(None).expect("names");
        assert_eq!(names.column, "NOME_QGC");
        assert_eq!(names.iter().collect::<Vec<_>>(), vec!["joao silva"]);
    }

    #[test]
    fn length_filter_counts_characters_not_bytes() {
        let names = NameSet::from_names("n", ["Zoé", "Joõo"]).expect("names");
        assert!(!names.contains("Zoé"));
        assert!(names.contains("Joõo"));
    }

    #[test]
    fn empty_name_set_is_an_error() {
        let err = NameSet::from_names("NOME", ["", "abc"]).expect_err("should be empty");
        assert!(matches!(err, FilterError::EmptyNameSet { .. }));
    }

    #[test]
    fn preview_keeps_first_rows_and_total() {
        let sheet = Sheet {
            columns: columns(&["NOME"]),
            rows: (0..8).map(|i| vec![Some(format!("name {i}"))]).collect(),
        };
        let preview = sheet.preview();
        assert_eq!(preview.head.len(), 5);
        assert_eq!(preview.total_rows, 8);
    }
}
