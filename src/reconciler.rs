//! Batched detail fetching and year selection
//!
//! Slices the matched hits into batches of the pool width, fetches each batch
//! through a fresh [`WorkerPool`], and picks the first candidate whose
//! published year matches the request (or the first candidate at all when no
//! year was requested). Years that were seen but did not match are collected
//! for the caller's diagnostics.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::hit::Hit;
use crate::item::BibliographicItem;
use crate::pool::WorkerPool;
use std::sync::Arc;

/// Detail-fetch concurrency; the remote catalog rejects more than three
/// concurrent connections in this phase.
pub const DEFAULT_FETCH_WIDTH: usize = 3;

/// Progress of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No batches dispatched yet
    Pending,
    /// Batches are being dispatched sequentially
    Scanning,
    /// A candidate was accepted
    Found,
    /// Every candidate was fetched and none matched
    Exhausted,
}

/// Fetches matched hits batch by batch and applies the year-selection rule
pub struct FetchReconciler<C: Catalog + 'static> {
    catalog: Arc<C>,
    width: usize,
    state: ScanState,
    mismatched_years: Vec<String>,
}

impl<C: Catalog + 'static> FetchReconciler<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            width: DEFAULT_FETCH_WIDTH,
            state: ScanState::Pending,
            mismatched_years: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Published years observed on candidates that did not match the request
    pub fn mismatched_years(&self) -> &[String] {
        &self.mismatched_years
    }

    /// Scan the hits in original order and return the first acceptable item
    ///
    /// Batches are strictly sequential: batch N+1 is not dispatched until
    /// batch N's pool has fully drained, which caps concurrent connections at
    /// the pool width. Once a candidate is accepted mid-batch, the remaining
    /// results of that batch are discarded and later batches are skipped.
    /// A fetch failure inside a batch fails the whole pass.
    pub async fn run(
        &mut self,
        hits: &[Arc<Hit>],
        year: Option<&str>,
    ) -> Result<Option<BibliographicItem>> {
        self.state = ScanState::Scanning;

        for batch in hits.chunks(self.width) {
            let mut pool: WorkerPool<Arc<Hit>, BibliographicItem> = WorkerPool::new(self.width);
            let catalog = Arc::clone(&self.catalog);
            pool.register(move |hit: Arc<Hit>| {
                let catalog = Arc::clone(&catalog);
                async move { hit.fetch(catalog.as_ref()).await }
            })?;

            for hit in batch {
                pool.submit(Arc::clone(hit)).await?;
            }

            // Results come back in submission order, i.e. results-page order.
            let items = pool.await_all().await?;

            for item in items {
                let Some(wanted) = year else {
                    self.state = ScanState::Found;
                    return Ok(Some(item));
                };

                let years = item.published_years();
                if years.iter().any(|y| y == wanted) {
                    self.state = ScanState::Found;
                    return Ok(Some(item));
                }

                tracing::debug!(
                    docid = %item.docid,
                    years = ?years,
                    wanted = %wanted,
                    "Candidate year mismatch, continuing scan"
                );
                self.mismatched_years.extend(years);
            }
        }

        self.state = ScanState::Exhausted;
        Ok(None)
    }
}
