//! HTTP-level tests for the IEC webstore client, served by mockito

use iecbib::{Catalog, Error, Hit, IecWebstore};
use mockito::{Matcher, Server};

const RESULTS_PAGE: &str = r#"
<html><body>
<ul class="search-results">
  <li><a href="/publication/4021">IEC&nbsp;60950-1:2005</a>
      Information technology equipment - Safety -
      Part 1: General requirements</li>
  <li><a href="/publication/7655">IEC&nbsp;60950-1:2013</a>
      Information technology equipment - Safety</li>
</ul>
<ul class="morethesame">
  <li><a href="/publication/1234">IEC 60950-22:2016</a> Outdoor equipment</li>
</ul>
</body></html>"#;

#[tokio::test]
async fn search_sends_code_and_year_range() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/searchkey")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("RefNbr".into(), "IEC 60950-1".into()),
            Matcher::UrlEncoded("From".into(), "2005-01-01".into()),
            Matcher::UrlEncoded("To".into(), "2005-12-31".into()),
            Matcher::UrlEncoded("start".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(RESULTS_PAGE)
        .expect(1)
        .create_async()
        .await;

    let store = IecWebstore::with_base_url(&server.url()).unwrap();
    let hits = store.search("IEC 60950-1", Some("2005"), None).await.unwrap();

    mock.assert_async().await;
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].code, "IEC 60950-1:2005");
    assert_eq!(hits[1].code, "IEC 60950-1:2013");
    assert_eq!(hits[2].code, "IEC 60950-22:2016");
    assert!(hits[0].title.starts_with("Information technology equipment"));
    assert!(hits[0].url.ends_with("/publication/4021"));
}

#[tokio::test]
async fn search_without_year_sends_empty_range() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/searchkey")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("RefNbr".into(), "IEC 61000".into()),
            Matcher::UrlEncoded("From".into(), "".into()),
            Matcher::UrlEncoded("To".into(), "".into()),
        ]))
        .with_status(200)
        .with_body("<html><body><ul class=\"search-results\"></ul></body></html>")
        .expect(1)
        .create_async()
        .await;

    let store = IecWebstore::with_base_url(&server.url()).unwrap();
    let hits = store.search("IEC 61000", None, None).await.unwrap();

    mock.assert_async().await;
    // An empty result list is a legitimate "no hits", not a failure.
    assert!(hits.is_empty());
}

#[tokio::test]
async fn transport_failure_is_catalog_unavailable() {
    // Nothing listens on this port.
    let store = IecWebstore::with_base_url("http://127.0.0.1:9").unwrap();
    let err = store.search("IEC 60950-1", None, None).await.unwrap_err();
    assert!(matches!(err, Error::CatalogUnavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn http_error_status_is_catalog_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let store = IecWebstore::with_base_url(&server.url()).unwrap();
    let err = store.search("IEC 60950-1", None, None).await.unwrap_err();
    assert!(matches!(err, Error::CatalogUnavailable(_)));
}

#[tokio::test]
async fn fetch_parses_detail_page() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/publication/4021")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(
            r#"<html><body>
            <h1>Information technology equipment - Safety - Part 1</h1>
            <dl>
              <dt>Publication date</dt><dd>2005-12-08</dd>
              <dt>Edition</dt><dd>2.0</dd>
            </dl>
            <div class="abstract">Applies to mains-powered equipment.</div>
            </body></html>"#,
        )
        .create_async()
        .await;

    let store = IecWebstore::with_base_url(&server.url()).unwrap();
    let hit = Hit::new(
        "IEC 60950-1:2005",
        "Fallback",
        format!("{}/publication/4021", server.url()),
    );

    let item = store.fetch(&hit).await.unwrap();
    assert_eq!(item.docid, "IEC 60950-1:2005");
    assert_eq!(item.published_years(), vec!["2005"]);
    assert_eq!(item.edition.as_deref(), Some("2.0"));
    assert_eq!(
        item.abstract_text.as_deref(),
        Some("Applies to mains-powered equipment.")
    );
}

#[tokio::test]
async fn fetch_failure_is_fetch_failed() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/publication/404")
        .with_status(404)
        .create_async()
        .await;

    let store = IecWebstore::with_base_url(&server.url()).unwrap();
    let hit = Hit::new(
        "IEC 1:2000",
        "Gone",
        format!("{}/publication/404", server.url()),
    );

    let err = store.fetch(&hit).await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed(_)));
}
