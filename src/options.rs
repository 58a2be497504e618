use std::str::FromStr;

use crate::error::FilterError;

pub const DEFAULT_MARKDOWN_TITLE: &str = "Filtered PDF Content";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    AutoDetect,
    HasHeader,
    NoHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMode {
    BestEffort,
    SkipAmbiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    TablesThenText,
    TextOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    /// Inclusive 1-based `(start, end)` ranges.
    ranges: Vec<(u32, u32)>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.ranges
            .iter()
            .any(|&(start, end)| (start..=end).contains(&page))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Parses `1-3,5` style selections into inclusive 1-based ranges.
fn parse_ranges(selection: &str) -> Result<Vec<(u32, u32)>, String> {
    let mut ranges = Vec::new();
    for token in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((start, end)) = token.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| format!("invalid page range start: '{start}'"))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| format!("invalid page range end: '{end}'"))?;
            if start == 0 || end == 0 {
                return Err("pages are 1-based".to_string());
            }
            if end < start {
                return Err(format!("invalid range '{token}': end is smaller than start"));
            }
            ranges.push((start, end));
        } else {
            let page: u32 = token
                .parse()
                .map_err(|_| format!("invalid page number: '{token}'"))?;
            if page == 0 {
                return Err("pages are 1-based".to_string());
            }
            ranges.push((page, page));
        }
    }

    if ranges.is_empty() {
        return Err("page selection cannot be empty".to_string());
    }

    Ok(ranges)
}

impl FromStr for PageSelection {
    type Err = FilterError;

    fn from_str(selection: &str) -> Result<Self, Self::Err> {
        parse_ranges(selection)
            .map(|ranges| Self { ranges })
            .map_err(FilterError::InvalidPageSelection)
    }
}

/// Knobs for the page scan and the renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub pages: Option<PageSelection>,
    pub header_mode: HeaderMode,
    pub quality_mode: QualityMode,
    pub content_mode: ContentMode,
    pub min_cols: usize,
    /// Share of non-empty page lines that must belong to detected tables
    /// before the page is rendered as tables instead of text.
    pub min_table_coverage: f32,
    /// Log a progress line every N pages; 0 disables it.
    pub progress_every: usize,
    pub delimiter: u8,
    pub include_page_column: bool,
    pub include_table_column: bool,
    pub markdown_title: String,
}

impl FilterOptions {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.min_cols < 2 {
            return Err("min_cols must be at least 2".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_table_coverage) {
            return Err("min_table_coverage must be between 0 and 1".to_string());
        }
        if !self.delimiter.is_ascii() || self.delimiter == b'\n' || self.delimiter == b'"' {
            return Err("delimiter must be a printable ASCII character".to_string());
        }
        Ok(())
    }
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            pages: None,
            header_mode: HeaderMode::HasHeader,
            quality_mode: QualityMode::BestEffort,
            content_mode: ContentMode::TablesThenText,
            min_cols: 2,
            min_table_coverage: 0.5,
            progress_every: 50,
            delimiter: b',',
            include_page_column: false,
            include_table_column: false,
            markdown_title: DEFAULT_MARKDOWN_TITLE.to_string(),
        }
    }
}
