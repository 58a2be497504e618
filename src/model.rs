/// Text of a single page. `page_number` is 1-based, as in the PDF page tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Raw grid found in the page text, before any header interpretation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetectedTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
    pub confidence: f32,
}

/// A table with a unique header per column. Every row has `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Tables(Vec<Table>),
    Text(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPage {
    pub index: usize,
    pub page_number: u32,
    pub content: PageContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedOutput {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub table_count: usize,
    pub row_count: usize,
}
