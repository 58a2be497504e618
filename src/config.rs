use std::path::{Path, PathBuf};

use crate::error::FilterError;
use crate::names::{NameSet, load_names};
use crate::options::FilterOptions;

pub const EXPLICIT_NAMES_COLUMN: &str = "<command line>";
pub const FILTERED_SUFFIX: &str = "_filtered";

/// Where the search vocabulary comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamesSource {
    Spreadsheet {
        path: PathBuf,
        column: Option<String>,
    },
    Explicit(Vec<String>),
}

impl NamesSource {
    pub(crate) fn check_exists(&self) -> Result<(), FilterError> {
        match self {
            Self::Spreadsheet { path, .. } => ensure_exists(path),
            Self::Explicit(_) => Ok(()),
        }
    }

    pub fn load(&self) -> Result<NameSet, FilterError> {
        match self {
            Self::Spreadsheet { path, column } => load_names(path, column.as_deref()),
            Self::Explicit(names) => NameSet::from_names(EXPLICIT_NAMES_COLUMN, names),
        }
    }
}

/// Which outputs to write and where. Unset paths default to
/// `<dir>/<pdf stem><suffix>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub write_pdf: bool,
    pub write_csv: bool,
    pub write_markdown: bool,
    pub pdf_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
    pub markdown_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
}

impl OutputConfig {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_pdf: true,
            write_csv: true,
            write_markdown: true,
            pdf_path: None,
            csv_path: None,
            markdown_path: None,
            summary_path: None,
        }
    }

    pub(crate) fn resolve(
        &self,
        explicit: Option<&PathBuf>,
        source: &Path,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        if let Some(path) = explicit {
            return path.clone();
        }
        let stem = source
            .file_stem()
            .map_or_else(|| "output".into(), |stem| stem.to_string_lossy());
        self.dir.join(format!("{stem}{suffix}.{extension}"))
    }
}

/// Everything one filter run needs; nothing is read from compiled-in paths.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub pdf: PathBuf,
    pub names: NamesSource,
    pub output: OutputConfig,
    pub options: FilterOptions,
}

impl RunConfig {
    #[must_use]
    pub fn new(
        pdf: impl Into<PathBuf>,
        names: NamesSource,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pdf: pdf.into(),
            names,
            output: OutputConfig::new(output_dir),
            options: FilterOptions::default(),
        }
    }
}

pub(crate) fn ensure_exists(path: &Path) -> Result<(), FilterError> {
    if path.exists() {
        Ok(())
    } else {
        Err(FilterError::MissingInput(path.to_path_buf()))
    }
}
