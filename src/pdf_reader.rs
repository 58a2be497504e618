use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::FilterError;
use crate::model::PageText;
use crate::table_parse::split_line_into_cells;

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

/// Decodes a PDF string operand. Falls back to UTF-16 for BOM-prefixed or
/// Unicode-encoded fonts and to Windows-1252 for raw Latin-1 bytes, which is
/// how accented Portuguese text often shows up in simple fonts.
fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    let lossy_latin = decoded.contains('\u{FFFD}') && std::str::from_utf8(bytes).is_err();
    if !lossy_latin && !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();
        if lower.contains("utf16") || lower.contains("ucs2") || lower.contains("identity-h") {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }
    }

    let (latin, _, _) = WINDOWS_1252.decode(bytes);
    latin.into_owned()
}

fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_cell_lines = 0_i64;
    let mut letters = 0_i64;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        non_empty_lines += 1;
        if split_line_into_cells(line).len() >= 2 {
            multi_cell_lines += 1;
        }
        letters += i64::try_from(line.chars().filter(|ch| ch.is_alphabetic()).count())
            .unwrap_or(i64::MAX / 4);
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    multi_cell_lines * 20 + non_empty_lines * 2 + letters / 10 - broken_penalty
}

fn choose_best_text(candidates: Vec<String>) -> String {
    candidates
        .into_iter()
        .max_by_key(|text| extraction_quality_score(text))
        .unwrap_or_default()
}

fn extract_text_from_page_content(
    document: &Document,
    page_id: ObjectId,
) -> Result<Option<String>, lopdf::Error> {
    fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    text.push_str(&decode_pdf_bytes(encoding, bytes));
                }
                Object::Array(items) => {
                    collect_text(text, encoding, items);
                    text.push(' ');
                }
                Object::Integer(value) => {
                    if *value < -100 {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    // `get_page_content` silently skips dangling stream references.
    for content_id in document.get_page_contents(page_id) {
        document.get_object(content_id)?.as_stream()?;
    }
    let raw_content = document.get_page_content(page_id)?;
    let content = Content::decode(&raw_content)?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_encoding = None;
    for operation in content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                if let Some(font_name) = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                {
                    current_encoding = encodings.get(font_name).copied();
                }
            }
            "Tj" | "TJ" | "'" | "\"" => {
                collect_text(&mut current, current_encoding, &operation.operands);
            }
            "T*" | "Td" | "TD" | "ET" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }

    Ok((!lines.is_empty()).then(|| lines.join("\n")))
}

/// An opened PDF that hands out page text one page at a time.
///
/// Text comes from up to three extractors (pdf-extract, the raw content
/// stream, lopdf's own `extract_text`); the candidate that looks most like
/// readable text wins.
pub struct PdfSource {
    document: Document,
    pages: Vec<(u32, ObjectId)>,
    extracted: Option<Vec<String>>,
}

impl PdfSource {
    pub fn open(path: &Path) -> Result<Self, FilterError> {
        if !path.exists() {
            return Err(FilterError::MissingInput(path.to_path_buf()));
        }
        let document = Document::load(path)?;
        let extracted = pdf_extract::extract_text(path).ok();
        Ok(Self::from_parts(document, extracted))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FilterError> {
        let document = Document::load_mem(bytes)?;
        let extracted = pdf_extract::extract_text_from_mem(bytes).ok();
        Ok(Self::from_parts(document, extracted))
    }

    fn from_parts(document: Document, extracted: Option<String>) -> Self {
        let pages = document.get_pages().into_iter().collect::<Vec<_>>();
        let extracted = extracted
            .map(|text| split_text_into_pages(&text))
            .filter(|split| split.len() == pages.len());
        if extracted.is_none() {
            debug!("pdf-extract page split unavailable; using content-stream text only");
        }
        Self {
            document,
            pages,
            extracted,
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Extracts the text of the page at `index` (0-based).
    pub fn page_text(&self, index: usize) -> Result<PageText, FilterError> {
        let &(page_number, page_id) = self.pages.get(index).ok_or(FilterError::PageOutOfRange {
            index,
            page_count: self.pages.len(),
        })?;

        let mut candidates = Vec::new();
        if let Some(text) = self
            .extracted
            .as_ref()
            .and_then(|pages| pages.get(index))
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text.clone());
        }

        let mut failure = None;
        match extract_text_from_page_content(&self.document, page_id) {
            Ok(Some(text)) => candidates.push(text),
            Ok(None) => {}
            Err(error) => failure = Some(error.to_string()),
        }

        if let Some(text) = self
            .document
            .extract_text(&[page_number])
            .ok()
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }

        if candidates.is_empty() {
            if let Some(reason) = failure {
                return Err(FilterError::PageExtract {
                    page: page_number,
                    reason,
                });
            }
        }

        Ok(PageText {
            page_number,
            text: choose_best_text(candidates),
        })
    }

    /// Writes a copy of the document that keeps only the pages at `indices`
    /// (0-based), in their original order, and returns its page count.
    /// Kept pages are not re-encoded.
    pub fn write_subset(&self, indices: &[usize], output: &Path) -> Result<usize, FilterError> {
        let keep = indices.iter().copied().collect::<BTreeSet<_>>();
        let drop = self
            .pages
            .iter()
            .enumerate()
            .filter(|(index, _)| !keep.contains(index))
            .map(|(_, (page_number, _))| *page_number)
            .collect::<Vec<_>>();

        let mut subset = self.document.clone();
        subset.delete_pages(&drop);
        subset.prune_objects();
        subset.save(output)?;

        Ok(subset.get_pages().len())
    }
}

#[cfg(test)]
mod tests {
    use super::{choose_best_text, decode_pdf_bytes, split_text_into_pages};

    #[test]
    fn splits_form_feed_delimited_pages() {
        let pages = split_text_into_pages("p1\u{000C}p2\u{000C}");
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn decodes_latin1_bytes_without_encoding_hint() {
        let decoded = decode_pdf_bytes(None, b"Jo\xe3o da Concei\xe7\xe3o");
        assert_eq!(decoded, "João da Conceição");
    }

    #[test]
    fn decodes_utf16_with_bom() {
        let decoded = decode_pdf_bytes(None, &[0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE7]);
        assert_eq!(decoded, "Aç");
    }

    #[test]
    fn prefers_readable_candidate() {
        let best = choose_best_text(vec![
            "\u{FFFD}\u{FFFD}\u{FFFD}".to_string(),
            "ALICE JONES credora".to_string(),
        ]);
        assert_eq!(best, "ALICE JONES credora");
    }
}
