// Search provider client module
// DuckDuckGo image search over plain HTTPS: front page for the vqd token,
// then the i.js JSON endpoint for paged results.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use super::types::RawImageResult;
use crate::config::SearchConfig;

/// Provider request timeout
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// The provider rejects requests without a browser-looking user agent
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Search provider errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("vqd token not found in provider response")]
    TokenNotFound,
}

/// Image search provider client
///
/// Cheap to clone; holds only the connection pool and fixed query settings.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    base_url: String,
    region: String,
    safesearch: &'static str,
}

/// One page of provider results
#[derive(Debug, Deserialize)]
struct ImagePage {
    #[serde(default)]
    results: Vec<RawImageResult>,
    #[serde(default)]
    next: Option<String>,
}

impl SearchClient {
    /// Create a client from search configuration
    pub fn new(cfg: &SearchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PROVIDER_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            region: cfg.region.clone(),
            safesearch: safesearch_param(&cfg.safesearch),
        })
    }

    /// Search for images, preserving provider order
    ///
    /// Follows the provider's paging cursor until `max_results` records are
    /// collected or the cursor ends. Any failure along the way aborts the
    /// whole search; no partial results are returned.
    pub async fn search_images(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawImageResult>, SearchError> {
        let vqd = self.fetch_vqd(query).await?;

        let mut collected: Vec<RawImageResult> = Vec::new();
        let mut offset: usize = 0;

        loop {
            let page = self.fetch_page(query, &vqd, offset).await?;
            let page_len = page.results.len();
            collected.extend(page.results);

            if collected.len() >= max_results || page.next.is_none() || page_len == 0 {
                break;
            }
            offset += page_len;
        }

        collected.truncate(max_results);
        Ok(collected)
    }

    /// Fetch the vqd request token from the provider front page
    async fn fetch_vqd(&self, query: &str) -> Result<String, SearchError> {
        let html = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("q", query), ("ia", "images")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        extract_vqd(&html).ok_or(SearchError::TokenNotFound)
    }

    /// Fetch one page of image results
    async fn fetch_page(
        &self,
        query: &str,
        vqd: &str,
        offset: usize,
    ) -> Result<ImagePage, SearchError> {
        let offset = offset.to_string();
        let page = self
            .client
            .get(format!("{}/i.js", self.base_url))
            .query(&[
                ("l", self.region.as_str()),
                ("o", "json"),
                ("q", query),
                ("vqd", vqd),
                ("f", ",,,"),
                ("p", self.safesearch),
                ("s", offset.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ImagePage>()
            .await?;

        Ok(page)
    }
}

/// Map the configured safe-search level to the provider's `p` parameter
fn safesearch_param(level: &str) -> &'static str {
    match level {
        "off" => "-1",
        // "on" and "moderate" share the same image-endpoint value
        _ => "1",
    }
}

/// Extract the vqd token from the provider front page
///
/// The token appears either quoted (`vqd="4-…"` / `vqd='4-…'`) or bare in a
/// URL (`vqd=4-…&`), depending on the page variant served.
fn extract_vqd(html: &str) -> Option<String> {
    for (pat, terminators) in [
        ("vqd=\"", "\""),
        ("vqd='", "'"),
        ("vqd=", "&\"'<> ;"),
    ] {
        if let Some(start) = html.find(pat) {
            let rest = &html[start + pat.len()..];
            let end = rest
                .find(|c: char| terminators.contains(c))
                .unwrap_or(rest.len());
            let token = &rest[..end];
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn test_config(base_url: String) -> SearchConfig {
        SearchConfig {
            base_url,
            region: "us-en".to_string(),
            safesearch: "moderate".to_string(),
        }
    }

    #[test]
    fn test_extract_vqd_double_quoted() {
        let html = r#"nrje('iur',{"vqd":x});vqd="4-123456789";load('/d.js')"#;
        assert_eq!(extract_vqd(html).as_deref(), Some("4-123456789"));
    }

    #[test]
    fn test_extract_vqd_single_quoted() {
        let html = "init(); vqd='4-987654321'; more();";
        assert_eq!(extract_vqd(html).as_deref(), Some("4-987654321"));
    }

    #[test]
    fn test_extract_vqd_bare_in_url() {
        let html = "/i.js?q=cats&vqd=4-555555&o=json";
        assert_eq!(extract_vqd(html).as_deref(), Some("4-555555"));
    }

    #[test]
    fn test_extract_vqd_missing() {
        assert!(extract_vqd("<html><body>no token here</body></html>").is_none());
    }

    #[test]
    fn test_safesearch_param() {
        assert_eq!(safesearch_param("moderate"), "1");
        assert_eq!(safesearch_param("on"), "1");
        assert_eq!(safesearch_param("off"), "-1");
    }

    #[tokio::test]
    async fn test_search_happy_path_preserves_order() {
        let mut server = mockito::Server::new_async().await;

        let front = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("q".into(), "cats".into()))
            .with_body(r#"vqd="4-111";"#)
            .create_async()
            .await;

        let page = server
            .mock("GET", "/i.js")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "cats".into()),
                Matcher::UrlEncoded("vqd".into(), "4-111".into()),
                Matcher::UrlEncoded("l".into(), "us-en".into()),
                Matcher::UrlEncoded("p".into(), "1".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results": [
                    {"title": "first", "image": "http://x/1.jpg"},
                    {"image": "http://x/2.jpg", "width": 640, "height": 480}
                ]}"#,
            )
            .create_async()
            .await;

        let client = SearchClient::new(&test_config(server.url())).unwrap();
        let results = client.search_images("cats", 10).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title.as_deref(), Some("first"));
        assert!(results[1].title.is_none());
        assert_eq!(results[1].width, Some(640));

        front.assert_async().await;
        page.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_truncates_to_max_results() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_body(r#"vqd="4-222";"#)
            .create_async()
            .await;

        server
            .mock("GET", "/i.js")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"results": [
                    {"title": "a"}, {"title": "b"}, {"title": "c"}
                ], "next": "i.js?s=3"}"#,
            )
            .create_async()
            .await;

        let client = SearchClient::new(&test_config(server.url())).unwrap();
        let results = client.search_images("dogs", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title.as_deref(), Some("a"));
        assert_eq!(results[1].title.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_provider_error_fails_whole_search() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_body(r#"vqd="4-333";"#)
            .create_async()
            .await;

        server
            .mock("GET", "/i.js")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = SearchClient::new(&test_config(server.url())).unwrap();
        let err = client.search_images("dogs", 10).await.unwrap_err();
        assert!(matches!(err, SearchError::Request(_)));
    }

    #[tokio::test]
    async fn test_missing_token_skips_result_fetch() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_body("<html>no token</html>")
            .create_async()
            .await;

        let results = server
            .mock("GET", "/i.js")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = SearchClient::new(&test_config(server.url())).unwrap();
        let err = client.search_images("dogs", 10).await.unwrap_err();
        assert!(matches!(err, SearchError::TokenNotFound));

        results.assert_async().await;
    }
}
