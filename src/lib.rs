//! iecbib - IEC/ISO standard reference resolution
//!
//! Resolves a free-form reference string (document code, optionally with
//! `:year`, `+bundle`, `/AMD n`, an "(all parts)" marker, or a packaged-part
//! indicator) into one canonical bibliographic record fetched from the IEC
//! webstore search service.
//!
//! Pipeline: raw string → [`Reference::parse`] → [`Catalog::search`] →
//! [`HitCollection::matching`] → [`WorkerPool`]-driven detail fetches →
//! [`FetchReconciler`] year selection → [`Resolver`] post-processing.
//!
//! ```no_run
//! use iecbib::{ResolveOptions, Resolver};
//!
//! # async fn run() -> iecbib::Result<()> {
//! let resolver = Resolver::new()?;
//! if let Some(item) = resolver.get("IEC 60950-1:2005", None, &ResolveOptions::default()).await? {
//!     println!("{}: {}", item.docid, item.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod codes;
pub mod error;
pub mod hit;
pub mod item;
pub mod pool;
pub mod reconciler;
pub mod reference;
pub mod resolver;

pub use crate::catalog::{Catalog, IecWebstore};
pub use crate::codes::PubCode;
pub use crate::error::{Error, Result};
pub use crate::hit::{Hit, HitCollection};
pub use crate::item::{BibliographicItem, PublicationDate};
pub use crate::pool::WorkerPool;
pub use crate::reconciler::{FetchReconciler, ScanState, DEFAULT_FETCH_WIDTH};
pub use crate::reference::Reference;
pub use crate::resolver::{ResolveOptions, Resolver};
