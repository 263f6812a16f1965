//! Error types for iecbib

use thiserror::Error;

/// Common result type for resolver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the resolution engine
///
/// "No match" is deliberately not represented here: a search that succeeds but
/// matches nothing returns `Ok(None)` from the resolver together with warning
/// diagnostics.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure (DNS, socket, TLS) while querying the catalog
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// A detail-record fetch failed inside a worker batch
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// Catalog response could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Worker pool misuse or worker task failure
    #[error("Worker pool error: {0}")]
    Pool(String),
}
