//! Late checks on records before they are written out
//!
//! Editing never rejects input. These checks run before export and remote
//! save so the user learns which rows will produce malformed XML.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;

use super::record::{Field, Record};

/// What is wrong with a field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueKind {
    #[error("tag name is empty")]
    EmptyTag,

    #[error("\"{0}\" is not a valid element name")]
    InvalidTag(String),

    #[error("cannot parse attributes near \"{0}\"")]
    MalformedAttributes(String),

    #[error("attribute \"{0}\" is given more than once")]
    DuplicateAttribute(String),
}

/// A problem found on one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub id: u64,
    pub field: Field,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} {}: {}", self.id, self.field, self.kind)
    }
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("tag pattern is valid")
    })
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*([A-Za-z_][A-Za-z0-9_.:-]*)\s*=\s*("[^"<]*"|'[^'<]*')"#)
            .expect("attribute pattern is valid")
    })
}

/// Check every record, returning issues in row order.
pub fn validate(records: &[Record]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for record in records {
        if let Some(kind) = check_tag(&record.tag) {
            issues.push(ValidationIssue {
                id: record.id,
                field: Field::Tag,
                kind,
            });
        }
        if let Some(kind) = check_attributes(&record.attributes) {
            issues.push(ValidationIssue {
                id: record.id,
                field: Field::Attributes,
                kind,
            });
        }
    }
    issues
}

fn check_tag(tag: &str) -> Option<IssueKind> {
    if tag.is_empty() {
        Some(IssueKind::EmptyTag)
    } else if !tag_pattern().is_match(tag) {
        Some(IssueKind::InvalidTag(tag.to_string()))
    } else {
        None
    }
}

fn check_attributes(fragment: &str) -> Option<IssueKind> {
    let mut seen = HashSet::new();
    let mut rest = fragment;

    while !rest.trim().is_empty() {
        let Some(caps) = attribute_pattern().captures(rest) else {
            return Some(IssueKind::MalformedAttributes(rest.trim().to_string()));
        };
        let name = &caps[1];
        if !seen.insert(name.to_string()) {
            return Some(IssueKind::DuplicateAttribute(name.to_string()));
        }
        let end = caps.get(0).map(|m| m.end()).unwrap_or(rest.len());
        rest = &rest[end..];
        // Pairs must be separated by whitespace
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return Some(IssueKind::MalformedAttributes(rest.trim().to_string()));
        }
    }
    None
}
