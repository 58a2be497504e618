use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::names::NameSet;

const PATTERN_SIZE_LIMIT: usize = 256 * (1 << 20);

/// Decides whether a page belongs to the match result.
pub trait PageMatcher {
    fn matches(&self, text: &str) -> bool;
}

/// Case-insensitive substring search for any name of a [`NameSet`].
///
/// Names are compiled into one escaped alternation. Very large vocabularies
/// can exceed the regex size limits even when raised; those fall back to a
/// lowercase scan with the same semantics.
#[derive(Debug, Clone)]
pub enum NameMatcher {
    Pattern(Regex),
    Folded(Vec<String>),
}

impl NameMatcher {
    #[must_use]
    pub fn new(names: &NameSet) -> Self {
        let pattern = names
            .iter()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");

        match RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .dfa_size_limit(PATTERN_SIZE_LIMIT)
            .build()
        {
            Ok(regex) => Self::Pattern(regex),
            Err(error) => {
                warn!(
                    %error,
                    names = names.len(),
                    "name pattern too large; using plain substring search"
                );
                Self::Folded(names.iter().map(str::to_lowercase).collect())
            }
        }
    }
}

impl PageMatcher for NameMatcher {
    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(text),
            Self::Folded(names) => {
                let folded = text.to_lowercase();
                names.iter().any(|name| folded.contains(name.as_str()))
            }
        }
    }
}

/// Accepts every page; used when converting a whole document.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPages;

impl PageMatcher for AllPages {
    fn matches(&self, _text: &str) -> bool {
        true
    }
}
