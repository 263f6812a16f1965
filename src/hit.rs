//! Search hits and hit collections
//!
//! A [`Hit`] is one lightweight search-result row (code/title/url) before its
//! full record has been fetched; a [`HitCollection`] is the ordered set of hits
//! one search call returned, plus the query that produced it.

use crate::catalog::Catalog;
use crate::codes::code_matches;
use crate::error::Result;
use crate::item::BibliographicItem;
use crate::reference::Reference;
use futures::stream::{self, StreamExt};
use std::sync::{Arc, OnceLock};

/// Default concurrency for the standalone [`HitCollection::fetch_all`] path
const FETCH_ALL_WIDTH: usize = 4;

/// One search-result reference before its full record is fetched
#[derive(Debug)]
pub struct Hit {
    /// Raw document code as shown on the results page
    pub code: String,
    /// Trailing free text of the result row
    pub title: String,
    /// Absolute URL of the detail page
    pub url: String,
    /// Memoized detail record, written at most once
    item: OnceLock<BibliographicItem>,
}

impl Hit {
    pub fn new(code: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            url: url.into(),
            item: OnceLock::new(),
        }
    }

    /// Fetch the full detail record, at most once
    ///
    /// The engine submits each hit to at most one in-flight fetch at a time,
    /// so the memoized field has a single writer.
    pub async fn fetch(&self, catalog: &dyn Catalog) -> Result<BibliographicItem> {
        if let Some(item) = self.item.get() {
            return Ok(item.clone());
        }
        let fetched = catalog.fetch(self).await?;
        Ok(self.item.get_or_init(|| fetched).clone())
    }

    /// Detail record, if a fetch has already completed
    pub fn fetched_item(&self) -> Option<&BibliographicItem> {
        self.item.get()
    }
}

/// Ordered candidate hits returned by one search call
///
/// Ordering is always the original results-page order; the collection lives
/// and dies with the resolution call that created it.
#[derive(Debug, Default)]
pub struct HitCollection {
    hits: Vec<Arc<Hit>>,
    fetched: bool,
    query_text: String,
    query_year: Option<String>,
}

impl HitCollection {
    pub fn new(hits: Vec<Hit>, query_text: impl Into<String>, query_year: Option<String>) -> Self {
        Self {
            hits: hits.into_iter().map(Arc::new).collect(),
            fetched: false,
            query_text: query_text.into(),
            query_year,
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Hit>> {
        self.hits.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Hit>> {
        self.hits.iter()
    }

    /// Search text this collection was built from
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// Year constraint this collection was built with
    pub fn query_year(&self) -> Option<&str> {
        self.query_year.as_deref()
    }

    /// True once a bulk-fetch pass has completed over every hit
    pub fn fetched(&self) -> bool {
        self.fetched
    }

    /// Ordered subsequence of hits whose code matches the reference
    ///
    /// Stable filter: survivors keep their original search-page order.
    pub fn matching(&self, reference: &Reference) -> Vec<Arc<Hit>> {
        let matched: Vec<Arc<Hit>> = self
            .hits
            .iter()
            .filter(|hit| code_matches(reference, &hit.code))
            .cloned()
            .collect();

        tracing::debug!(
            query = %reference.code,
            candidates = self.hits.len(),
            matched = matched.len(),
            "Filtered search hits"
        );

        matched
    }

    /// Fetch every hit's detail record with bounded concurrency
    ///
    /// Convenience path for callers that want the whole collection populated;
    /// results land in the hits' memoized fields. Order of completion does not
    /// matter here since each hit owns its own record.
    pub async fn fetch_all(&mut self, catalog: &dyn Catalog) -> Result<()> {
        stream::iter(self.hits.iter().cloned())
            .map(|hit| async move { hit.fetch(catalog).await.map(|_| ()) })
            .buffered(FETCH_ALL_WIDTH)
            .collect::<Vec<Result<()>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>>>()?;

        self.fetched = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(codes: &[&str]) -> HitCollection {
        let hits = codes
            .iter()
            .map(|c| Hit::new(*c, format!("{c} title"), format!("https://example.org/{c}")))
            .collect();
        HitCollection::new(hits, codes.first().copied().unwrap_or_default(), None)
    }

    #[test]
    fn matching_preserves_original_order() {
        let coll = collection(&[
            "IEC 60950-1:2005",
            "IEC 60950-22",
            "IEC 60950-1:2013",
            "IEC 60065",
        ]);
        let reference = Reference::parse("IEC 60950-1");
        let matched = coll.matching(&reference);
        let codes: Vec<&str> = matched.iter().map(|h| h.code.as_str()).collect();
        assert_eq!(codes, vec!["IEC 60950-1:2005", "IEC 60950-1:2013"]);
    }

    #[test]
    fn matching_is_a_subsequence() {
        let coll = collection(&["IEC 61000-1", "IEC 61000-2", "IEC 61000-3"]);
        let reference = Reference::parse("IEC 61000 (all parts)");
        let matched = coll.matching(&reference);
        assert_eq!(matched.len(), 3);
        for (hit, original) in matched.iter().zip(coll.iter()) {
            assert_eq!(hit.code, original.code);
        }
    }

    #[test]
    fn matching_may_be_empty() {
        let coll = collection(&["IEC 60065"]);
        let reference = Reference::parse("IEC 60950-1");
        assert!(coll.matching(&reference).is_empty());
    }
}
