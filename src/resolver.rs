//! Top-level reference resolution
//!
//! Orchestrates the whole pipeline: parse → search (with packaged-part retry)
//! → filter → batched fetch/reconcile → post-process. "Not found" is a
//! successful call returning `None` plus warning diagnostics; transport and
//! fetch failures propagate as errors.

use crate::catalog::{Catalog, IecWebstore};
use crate::codes::PubCode;
use crate::error::Result;
use crate::hit::HitCollection;
use crate::item::BibliographicItem;
use crate::reconciler::FetchReconciler;
use crate::reference::Reference;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// The vocabulary dictionary shorthand resolved without a network call
const IEV_CODE: &str = "IEV";

fn packaged_part_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "IEC 60050-311" → base "IEC 60050-3", part "311"
    RE.get_or_init(|| Regex::new(r"^(?P<head>.+-)(?P<lead>\d)(?P<rest>\d+)$").unwrap())
}

/// Options for [`Resolver::get`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Resolve to a reference covering every part of the standard
    pub all_parts: bool,
    /// Keep the resolved edition year even when none was requested
    pub keep_year: bool,
}

/// Resolves reference strings against a catalog
pub struct Resolver<C: Catalog + 'static> {
    catalog: Arc<C>,
}

impl Resolver<IecWebstore> {
    /// Resolver over the live IEC webstore
    pub fn new() -> Result<Self> {
        Ok(Self::with_catalog(IecWebstore::new()?))
    }
}

impl<C: Catalog + 'static> Resolver<C> {
    /// Resolver over an injected catalog implementation
    pub fn with_catalog(catalog: C) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Resolve one reference string to a bibliographic record
    ///
    /// Returns `Ok(None)` when the catalog answered but nothing matched; the
    /// possible causes are logged as warnings. Hard failures (transport,
    /// detail-fetch) are returned as errors.
    pub async fn get(
        &self,
        code: &str,
        year: Option<&str>,
        opts: &ResolveOptions,
    ) -> Result<Option<BibliographicItem>> {
        let trimmed = code.trim();
        if trimmed == IEV_CODE {
            debug!("Resolving IEV shorthand without a catalog query");
            return Ok(Some(iev_item()));
        }

        let mut reference = Reference::parse(trimmed);
        if reference.year.is_none() {
            // An amendment or bundle suffix keeps the :YYYY inside the code;
            // pull it out so year selection still applies to the scan.
            reference.year = PubCode::extract(&reference.code)
                .and_then(|c| c.year)
                .or_else(|| year.map(str::to_string));
        }
        reference.all_parts = reference.all_parts || opts.all_parts;

        info!(
            code = %reference.code,
            year = ?reference.year,
            all_parts = reference.all_parts,
            "Resolving reference"
        );

        let collection = self
            .search(&reference.code, reference.year.as_deref(), None)
            .await?;
        let mut matched = collection.matching(&reference);
        let mut active = reference.clone();

        // A dash-part code with no plain match may be a part of a packaged
        // standard; retry once against the packaged base.
        if matched.is_empty() {
            if let Some((base, part)) = packaged_part(&reference.code) {
                debug!(
                    code = %reference.code,
                    base = %base,
                    part = %part,
                    "Plain search empty, retrying as packaged part"
                );
                let retry = reference.as_packaged_part(&base, &part);
                let retry_collection = self
                    .search(&retry.code, retry.year.as_deref(), retry.part.as_deref())
                    .await?;
                matched = retry_collection.matching(&retry);
                active = retry;
            }
        }

        if matched.is_empty() {
            warn_no_match(&reference, &[]);
            return Ok(None);
        }

        let mut reconciler = FetchReconciler::new(Arc::clone(&self.catalog));
        let Some(mut item) = reconciler.run(&matched, active.year.as_deref()).await? else {
            warn_no_match(&reference, reconciler.mismatched_years());
            return Ok(None);
        };

        if active.year.is_none() && !opts.keep_year {
            item = item.into_most_recent_reference();
        }
        if active.all_parts {
            item = item.into_all_parts_reference();
        }

        info!(docid = %item.docid, "Reference resolved");
        Ok(Some(item))
    }

    /// The catalog this resolver queries
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Run one raw search and return the unfiltered hit collection
    pub async fn search(
        &self,
        text: &str,
        year: Option<&str>,
        part: Option<&str>,
    ) -> Result<HitCollection> {
        let hits = self.catalog.search(text, year, part).await?;
        Ok(HitCollection::new(hits, text, year.map(str::to_string)))
    }
}

/// Split a `...-NNN` code into its packaged base and part
///
/// The base runs through the first digit of the dash section: `IEC 60050-311`
/// is part `311` of the packaged standard `IEC 60050-3`.
fn packaged_part(code: &str) -> Option<(String, String)> {
    let caps = packaged_part_re().captures(code.trim())?;
    let base = format!("{}{}", &caps["head"], &caps["lead"]);
    let part = format!("{}{}", &caps["lead"], &caps["rest"]);
    Some((base, part))
}

/// Canonical record for the International Electrotechnical Vocabulary
fn iev_item() -> BibliographicItem {
    let mut item = BibliographicItem::new(
        "IEC 60050 (all parts)",
        "International Electrotechnical Vocabulary",
    );
    item.url = Some("https://www.electropedia.org".to_string());
    item.all_parts = true;
    item
}

fn warn_no_match(reference: &Reference, mismatched_years: &[String]) {
    if mismatched_years.is_empty() {
        warn!(code = %reference.code, "No matching standard found");
    } else {
        warn!(
            code = %reference.code,
            year = ?reference.year,
            observed_years = ?mismatched_years,
            "No match for the requested year, but matches exist for other years"
        );
    }

    if reference.code.contains('-') && !reference.all_parts {
        warn!(
            "The reference may need an \"(all parts)\" marker or a \
             document-type abbreviation to match a multi-part standard"
        );
    }
}
