// src/models/records.rs

//! Structured data extracted from portal pages.

use std::collections::BTreeMap;

use serde::Serialize;

/// Logical field name to extracted text.
pub type KeyValueRecord = BTreeMap<String, String>;

/// Rows of cell text from one HTML table. Never contains an empty row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedTable {
    rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    /// Append a row; empty rows are dropped.
    pub fn push_row(&mut self, cells: Vec<String>) {
        if !cells.is_empty() {
            self.rows.push(cells);
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single announcement row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnouncementRecord {
    pub id: String,
    pub title: String,
    /// Absolute URL
    pub url: String,
    pub date_text: String,
    pub source_tag: String,
}

/// One row of the academic records grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcademicRecord {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub class_level: String,
    pub yearly_credits: String,
    pub fall_credits: String,
    pub spring_credits: String,
    pub total_credits: String,
    pub gpa: String,
}

/// An entry of the portal's main menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuLink {
    pub text: String,
    pub href: String,
    pub tabindex: String,
}

/// An anchor selected by keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    pub text: String,
    pub href: String,
}

/// Parsed student information page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentInfo {
    /// Profile fields that were found; absent keys mean "unknown"
    #[serde(flatten)]
    pub fields: KeyValueRecord,
    pub academic_records: Vec<AcademicRecord>,
    pub menu_links: Vec<MenuLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_at: Option<String>,
}

/// All tables of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSet {
    pub url: String,
    pub tables: Vec<ExtractedTable>,
}

/// Header-keyed records mined from a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSet {
    pub url: String,
    pub records: Vec<KeyValueRecord>,
}

/// Announcements of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnouncementList {
    pub announcements: Vec<AnnouncementRecord>,
    pub count: usize,
    pub source: String,
}

impl AnnouncementList {
    pub fn new(announcements: Vec<AnnouncementRecord>, source: impl Into<String>) -> Self {
        Self {
            count: announcements.len(),
            announcements,
            source: source.into(),
        }
    }
}

/// Keyword-selected links of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkList {
    pub url: String,
    pub links: Vec<LinkRecord>,
}

/// Raw view of a navigated page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSnapshot {
    pub status_code: u16,
    pub url: String,
    pub content: String,
}
