//! Wildcard filters for bucket keys.
//!
//! `*` matches any run of characters and everything else is literal. The
//! compiled expression is searched for anywhere in the key (it is not
//! anchored at either end), so `report` selects `2024/report-final.csv`.
//! An optional key prefix is anchored at the start of the key.

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WildcardError {
    #[error("Invalid wildcard pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// True when the filter needs a bucket listing to resolve
pub fn has_wildcard(filter: &str) -> bool {
    filter.contains('*')
}

/// Translate a wildcard into regex source. Runs of `*` collapse into one `.*`.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut literal = String::new();
    let mut prev_star = false;

    for c in pattern.chars() {
        if c == '*' {
            if !literal.is_empty() {
                out.push_str(&regex::escape(&literal));
                literal.clear();
            }
            if !prev_star {
                out.push_str(".*");
            }
            prev_star = true;
            continue;
        }
        literal.push(c);
        prev_star = false;
    }
    if !literal.is_empty() {
        out.push_str(&regex::escape(&literal));
    }
    out
}

/// Compiled key filter
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compile a filter with no key prefix
    pub fn compile(pattern: &str) -> Result<Self, WildcardError> {
        Self::compile_with_prefix(pattern, "")
    }

    /// Compile a filter scoped under a literal key prefix
    pub fn compile_with_prefix(pattern: &str, prefix: &str) -> Result<Self, WildcardError> {
        let mut source = String::new();
        if !prefix.is_empty() {
            source.push('^');
            source.push_str(&regex::escape(prefix));
        }
        source.push_str(&wildcard_to_regex(pattern));

        let regex = Regex::new(&source).map_err(|e| WildcardError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;
        Ok(Self { source, regex })
    }

    /// The regex source this pattern was compiled to
    pub fn expression(&self) -> &str {
        &self.source
    }

    /// Unanchored search against `key`
    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}
