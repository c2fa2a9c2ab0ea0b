//! Tabular record model: one row per top-level XML element

use std::fmt;

/// Tag assigned to freshly added rows
pub const DEFAULT_TAG: &str = "newtag";

/// A single editable row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Session-unique identifier, stable across edits
    pub id: u64,
    /// Element name
    pub tag: String,
    /// Element text content (unescaped)
    pub value: String,
    /// Raw `name="value"` fragment inserted after the tag name
    pub attributes: String,
}

/// Editable columns of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Tag,
    Value,
    Attributes,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Tag, Field::Value, Field::Attributes];

    /// Column header label
    pub fn label(self) -> &'static str {
        match self {
            Field::Tag => "Tag Name",
            Field::Value => "Value",
            Field::Attributes => "Attributes",
        }
    }

    /// Hint shown in empty cells
    pub fn placeholder(self) -> &'static str {
        match self {
            Field::Tag => "tag-name",
            Field::Value => "value",
            Field::Attributes => "attr=\"value\"",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Tag => "tag",
            Field::Value => "value",
            Field::Attributes => "attributes",
        };
        f.write_str(name)
    }
}

impl Record {
    /// Create a record
    pub fn new(
        id: u64,
        tag: impl Into<String>,
        value: impl Into<String>,
        attributes: impl Into<String>,
    ) -> Self {
        Self {
            id,
            tag: tag.into(),
            value: value.into(),
            attributes: attributes.into(),
        }
    }

    /// A placeholder row as appended by "Add Row"
    pub fn placeholder(id: u64) -> Self {
        Self::new(id, DEFAULT_TAG, "", "")
    }

    /// Read one field
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Tag => &self.tag,
            Field::Value => &self.value,
            Field::Attributes => &self.attributes,
        }
    }

    /// Mutable access to one field
    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Tag => &mut self.tag,
            Field::Value => &mut self.value,
            Field::Attributes => &mut self.attributes,
        }
    }

    /// The sample document the editor starts with
    pub fn sample_set() -> Vec<Record> {
        vec![
            Record::new(1, "title", "Sample Document", r#"lang="en""#),
            Record::new(2, "author", "John Doe", ""),
            Record::new(3, "date", "2024-01-20", r#"format="YYYY-MM-DD""#),
            Record::new(4, "version", "1.0", ""),
            Record::new(5, "description", "A sample metadata document", ""),
        ]
    }
}

/// Next free id: one past the largest id in use, or 1
pub fn next_id(records: &[Record]) -> u64 {
    records.iter().map(|r| r.id).max().unwrap_or(0) + 1
}
