//! Search endpoint handler
//!
//! Parses the client request, relays the query to the provider and maps the
//! raw records into the fixed response schema.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::config::AppState;
use crate::error::ApiError;
use crate::http::response::json_response;
use crate::logger;
use crate::search::{SearchRequest, SearchResponse, SearchResult};

/// Handle `POST /search`
pub async fn handle(state: &AppState, body: &Bytes) -> Response<Full<Bytes>> {
    let request: SearchRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return ApiError::BadBody(e.to_string()).into_response(),
    };

    logger::log_search_query(&request.query);

    match state
        .search
        .search_images(&request.query, request.max_results)
        .await
    {
        Ok(raw_results) => {
            // Provider order is preserved as-is
            let results: Vec<SearchResult> =
                raw_results.into_iter().map(SearchResult::from).collect();
            json_response(StatusCode::OK, &SearchResponse { results })
        }
        Err(e) => {
            logger::log_search_failed(&e);
            ApiError::SearchFailed(e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use mockito::Matcher;

    fn test_state(search_base_url: String) -> AppState {
        let mut config = Config::load_from("nonexistent-config").unwrap();
        config.search.base_url = search_base_url;
        config.logging.access_log = false;
        AppState::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_normalized_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_body(r#"vqd="4-42";"#)
            .create_async()
            .await;
        server
            .mock("GET", "/i.js")
            .match_query(Matcher::Any)
            .with_body(r#"{"results": [{"image": "http://x/1.jpg"}]}"#)
            .create_async()
            .await;

        let state = test_state(server.url());
        let body = Bytes::from(r#"{"query": "cats", "max_results": 5}"#);
        let resp = handle(&state, &body).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_500() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let state = test_state(server.url());
        let body = Bytes::from(r#"{"query": "cats"}"#);
        let resp = handle(&state, &body).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_400() {
        let mut server = mockito::Server::new_async().await;
        let provider = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let state = test_state(server.url());
        let body = Bytes::from("not json at all");
        let resp = handle(&state, &body).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        provider.assert_async().await;
    }
}
