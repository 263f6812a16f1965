//! IEC webstore catalog client
//!
//! The [`Catalog`] trait is the seam between the resolution engine and the
//! remote service: one search call returning lightweight hits, and one detail
//! fetch per hit. [`IecWebstore`] implements it over HTTP with HTML scraping.

use crate::error::{Error, Result};
use crate::hit::Hit;
use crate::item::{BibliographicItem, PublicationDate};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const WEBSTORE_BASE_URL: &str = "https://webstore.iec.ch";
const USER_AGENT: &str = concat!("iecbib/", env!("CARGO_PKG_VERSION"));

/// Remote catalog boundary
///
/// An empty search result is a legitimate "no hits", not a failure; transport
/// failures surface as [`Error::CatalogUnavailable`].
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Run one search, optionally constrained to a publication year
    ///
    /// `part` travels with packaged-part retries; the webstore query itself
    /// only carries the code and year range, so the default implementation may
    /// ignore it beyond logging.
    async fn search(
        &self,
        code: &str,
        year: Option<&str>,
        part: Option<&str>,
    ) -> Result<Vec<Hit>>;

    /// Fetch the full bibliographic record behind one hit
    async fn fetch(&self, hit: &Hit) -> Result<BibliographicItem>;
}

/// HTTP client for the IEC webstore search service
pub struct IecWebstore {
    http: reqwest::Client,
    base_url: Url,
}

impl IecWebstore {
    pub fn new() -> Result<Self> {
        Self::with_base_url(WEBSTORE_BASE_URL)
    }

    /// Build a client against a non-default base URL (tests)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::CatalogUnavailable(e.to_string()))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| Error::CatalogUnavailable(format!("bad base url: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// Search URL with `RefNbr`, `From`, `To` and fixed `start=1` parameters
    ///
    /// The year range covers the whole requested year; both bounds are empty
    /// when no year is given. `Url` percent-normalizes the query pairs.
    fn search_url(&self, code: &str, year: Option<&str>) -> Result<Url> {
        let (from, to) = match year {
            Some(year) => year_range(year)?,
            None => (String::new(), String::new()),
        };

        let mut url = self
            .base_url
            .join("searchkey")
            .map_err(|e| Error::CatalogUnavailable(format!("bad search url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("RefNbr", code)
            .append_pair("From", &from)
            .append_pair("To", &to)
            .append_pair("start", "1");
        Ok(url)
    }

    fn parse_results_page(&self, body: &str) -> Result<Vec<Hit>> {
        let row_sel = selector("ul.search-results > li, ul.morethesame > li")?;
        let link_sel = selector("a[href]")?;

        let doc = Html::parse_document(body);
        let mut hits = Vec::new();

        for row in doc.select(&row_sel) {
            let Some(link) = row.select(&link_sel).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };

            // The anchor text carries a non-breaking-space artifact.
            let code = link
                .text()
                .collect::<String>()
                .replace('\u{a0}', " ")
                .trim()
                .to_string();

            // Title is the row's own trailing text, newlines removed.
            let title = row
                .children()
                .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
                .collect::<String>()
                .replace(['\r', '\n'], "")
                .trim()
                .to_string();

            let url = self
                .base_url
                .join(href)
                .map_err(|e| Error::Parse(format!("bad hit href {href}: {e}")))?;

            hits.push(Hit::new(code, title, url.as_str()));
        }

        Ok(hits)
    }

    fn parse_detail_page(&self, hit: &Hit, body: &str) -> Result<BibliographicItem> {
        let doc = Html::parse_document(body);

        let title = doc
            .select(&selector("h1")?)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| hit.title.clone());

        let mut item = BibliographicItem::new(hit.code.clone(), title);
        item.url = Some(hit.url.clone());

        // Detail properties are laid out as dt/dd pairs.
        for dt in doc.select(&selector("dt")?) {
            let Some(dd) = next_dd(dt) else { continue };
            let label = element_text(dt).to_lowercase();
            let value = element_text(dd);

            match label.as_str() {
                "publication date" => item.dates.push(PublicationDate::published(value)),
                "edition" => item.edition = Some(value),
                _ => {}
            }
        }

        if let Some(abstract_el) = doc.select(&selector("div.abstract")?).next() {
            let text = element_text(abstract_el);
            if !text.is_empty() {
                item.abstract_text = Some(text);
            }
        }

        Ok(item)
    }
}

#[async_trait]
impl Catalog for IecWebstore {
    async fn search(
        &self,
        code: &str,
        year: Option<&str>,
        part: Option<&str>,
    ) -> Result<Vec<Hit>> {
        let url = self.search_url(code, year)?;
        tracing::debug!(code = %code, year = ?year, part = ?part, url = %url, "Searching IEC webstore");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::CatalogUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CatalogUnavailable(format!(
                "search returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::CatalogUnavailable(e.to_string()))?;

        let hits = self.parse_results_page(&body)?;
        tracing::debug!(code = %code, hits = hits.len(), "Search complete");
        Ok(hits)
    }

    async fn fetch(&self, hit: &Hit) -> Result<BibliographicItem> {
        tracing::debug!(code = %hit.code, url = %hit.url, "Fetching detail record");

        let response = self
            .http
            .get(hit.url.as_str())
            .send()
            .await
            .map_err(|e| Error::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailed(format!(
                "{} returned HTTP {status}",
                hit.code
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::FetchFailed(e.to_string()))?;

        self.parse_detail_page(hit, &body)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("selector {css}: {e}")))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// The `<dd>` element following a `<dt>`
fn next_dd(dt: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut node = dt.next_sibling();
    while let Some(current) = node {
        if let Some(el) = ElementRef::wrap(current) {
            return (el.value().name() == "dd").then_some(el);
        }
        node = current.next_sibling();
    }
    None
}

/// Jan 1 – Dec 31 of the requested year, formatted `%Y-%m-%d`
fn year_range(year: &str) -> Result<(String, String)> {
    let y: i32 = year
        .parse()
        .map_err(|_| Error::Parse(format!("invalid year: {year}")))?;
    let from = NaiveDate::from_ymd_opt(y, 1, 1)
        .ok_or_else(|| Error::Parse(format!("invalid year: {year}")))?;
    let to = NaiveDate::from_ymd_opt(y, 12, 31)
        .ok_or_else(|| Error::Parse(format!("invalid year: {year}")))?;
    Ok((
        from.format("%Y-%m-%d").to_string(),
        to.format("%Y-%m-%d").to_string(),
    ))
}
