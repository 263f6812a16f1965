//! Bibliographic item data model
//!
//! The engine only ever reads two things from a fetched record: its
//! docidentifier and its "published" dates. The collapse operations at the
//! bottom are the post-processing steps applied by the resolver.

use serde::{Deserialize, Serialize};

/// A dated event in a document's publication history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationDate {
    /// Date kind tag, e.g. `"published"`
    pub kind: String,
    /// ISO-8601 date or bare year; the first four characters are the year
    pub value: String,
}

impl PublicationDate {
    pub fn published(value: impl Into<String>) -> Self {
        Self {
            kind: "published".to_string(),
            value: value.into(),
        }
    }

    /// Year component of the date value
    pub fn year(&self) -> Option<&str> {
        let year = self.value.get(0..4)?;
        year.chars().all(|c| c.is_ascii_digit()).then_some(year)
    }
}

/// One resolved bibliographic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicItem {
    /// Document identifier, e.g. `"IEC 60950-1:2005"`
    pub docid: String,
    /// Document title
    pub title: String,
    /// Canonical URL of the record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Edition label when the catalog page carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    /// Abstract text when the catalog page carries one
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Publication history
    pub dates: Vec<PublicationDate>,
    /// True when this record stands for every part of a multi-part standard
    #[serde(default)]
    pub all_parts: bool,
}

impl BibliographicItem {
    pub fn new(docid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            docid: docid.into(),
            title: title.into(),
            url: None,
            edition: None,
            abstract_text: None,
            dates: Vec::new(),
            all_parts: false,
        }
    }

    /// Years of every date tagged "published"
    pub fn published_years(&self) -> Vec<String> {
        self.dates
            .iter()
            .filter(|d| d.kind == "published")
            .filter_map(|d| d.year().map(str::to_string))
            .collect()
    }

    /// Most-recent-reference collapse
    ///
    /// Absent an explicit requested year, the returned item cites the document
    /// without an edition year so it always denotes the latest edition.
    pub fn into_most_recent_reference(mut self) -> Self {
        if let Some(pos) = self.docid.find(':') {
            self.docid.truncate(pos);
        }
        self
    }

    /// All-parts collapse
    ///
    /// Rewrites the docidentifier to cite every part of the standard as one
    /// reference, dropping the part and year components.
    pub fn into_all_parts_reference(mut self) -> Self {
        if let Some(pos) = self.docid.find(':') {
            self.docid.truncate(pos);
        }
        if let Some(pos) = self.docid.find('-') {
            self.docid.truncate(pos);
        }
        self.docid = format!("{} (all parts)", self.docid.trim_end());
        self.all_parts = true;
        self
    }
}
