//! Table name inclusion patterns.
//!
//! A pattern is either `*` (everything), an exact name, or a name fragment with
//! a leading and/or trailing `*`:
//!
//! | pattern  | matches names that        |
//! |----------|---------------------------|
//! | `*`      | (all names)               |
//! | `ORDERS` | equal `ORDERS`            |
//! | `*TMP*`  | contain `TMP`             |
//! | `*_LOG`  | end with `_LOG`           |
//! | `SYS_*`  | start with `SYS_`         |
//!
//! Comparison is case-sensitive against the names the driver reports.

use std::fmt;

/// A parsed inclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableNamePattern {
    /// `*`
    Any,
    /// No wildcard.
    Exact(String),
    /// `*fragment*`
    Contains(String),
    /// `*suffix`
    EndsWith(String),
    /// `prefix*`
    StartsWith(String),
}

impl TableNamePattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            return TableNamePattern::Any;
        }
        let leading = pattern.starts_with('*');
        let trailing = pattern.ends_with('*');
        match (leading, trailing) {
            (true, true) => TableNamePattern::Contains(pattern[1..pattern.len() - 1].to_string()),
            (true, false) => TableNamePattern::EndsWith(pattern[1..].to_string()),
            (false, true) => TableNamePattern::StartsWith(pattern[..pattern.len() - 1].to_string()),
            (false, false) => TableNamePattern::Exact(pattern.to_string()),
        }
    }

    /// Check whether a table name matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            TableNamePattern::Any => true,
            TableNamePattern::Exact(exact) => name == exact,
            TableNamePattern::Contains(fragment) => name.contains(fragment.as_str()),
            TableNamePattern::EndsWith(suffix) => name.ends_with(suffix.as_str()),
            TableNamePattern::StartsWith(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for TableNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableNamePattern::Any => f.write_str("*"),
            TableNamePattern::Exact(s) => f.write_str(s),
            TableNamePattern::Contains(s) => write!(f, "*{}*", s),
            TableNamePattern::EndsWith(s) => write!(f, "*{}", s),
            TableNamePattern::StartsWith(s) => write!(f, "{}*", s),
        }
    }
}

/// A set of inclusion patterns; a name is included if any pattern matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNameFilter {
    patterns: Vec<TableNamePattern>,
}

impl TableNameFilter {
    /// Build a filter from pattern strings.
    ///
    /// An empty list yields the match-all filter.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<TableNamePattern> = patterns
            .into_iter()
            .map(|p| TableNamePattern::parse(p.as_ref()))
            .collect();
        if patterns.is_empty() {
            patterns.push(TableNamePattern::Any);
        }
        Self { patterns }
    }

    /// The filter matching every name.
    pub fn match_all() -> Self {
        Self {
            patterns: vec![TableNamePattern::Any],
        }
    }

    /// Check whether at least one pattern matches the name.
    pub fn is_included(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    pub fn patterns(&self) -> &[TableNamePattern] {
        &self.patterns
    }
}

impl Default for TableNameFilter {
    fn default() -> Self {
        Self::match_all()
    }
}
