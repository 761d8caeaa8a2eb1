//! Image proxy endpoint handler
//!
//! Validates the `url` query parameter before anything touches the network,
//! then runs the fetch/normalize pipeline.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::config::AppState;
use crate::error::ApiError;
use crate::http::response::build_jpeg_response;
use crate::logger;
use crate::proxy;

/// Handle `GET /proxy-image?url=…`
pub async fn handle(state: &AppState, query: Option<&str>) -> Response<Full<Bytes>> {
    let url = match extract_url_param(query) {
        Some(url) if !url.is_empty() => url,
        // Missing or empty: fail before any outbound request is issued
        _ => {
            return ApiError::MissingParam("Missing URL parameter".to_string()).into_response();
        }
    };

    match proxy::fetch_and_normalize(&state.proxy_client, &url).await {
        Ok(jpeg) => build_jpeg_response(Bytes::from(jpeg)),
        Err(e) => {
            logger::log_proxy_failed(&url, &e);
            ApiError::ProxyFailed(e.to_string()).into_response()
        }
    }
}

/// Extract the percent-decoded `url` parameter from a raw query string
fn extract_url_param(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hyper::StatusCode;
    use mockito::Matcher;

    fn test_state() -> AppState {
        let mut config = Config::load_from("nonexistent-config").unwrap();
        config.logging.access_log = false;
        AppState::new(config).unwrap()
    }

    #[test]
    fn test_extract_url_param() {
        assert_eq!(
            extract_url_param(Some("url=http%3A%2F%2Fx%2Fa.jpg")).as_deref(),
            Some("http://x/a.jpg")
        );
        assert_eq!(
            extract_url_param(Some("other=1&url=http://x/a.jpg")).as_deref(),
            Some("http://x/a.jpg")
        );
        assert_eq!(extract_url_param(Some("url=")).as_deref(), Some(""));
        assert_eq!(extract_url_param(Some("other=1")), None);
        assert_eq!(extract_url_param(None), None);
    }

    #[tokio::test]
    async fn test_missing_url_is_400_with_no_outbound_call() {
        let mut server = mockito::Server::new_async().await;
        let origin = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let state = test_state();
        for query in [None, Some(""), Some("url="), Some("other=1")] {
            let resp = handle(&state, query).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        origin.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_404_surfaces_cause_in_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gone.jpg")
            .with_status(404)
            .create_async()
            .await;

        let state = test_state();
        let query = format!("url={}/gone.jpg", server.url());
        let resp = handle(&state, Some(&query)).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = http_body_util::BodyExt::collect(resp.into_body())
            .await
            .unwrap()
            .to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let detail = parsed["detail"].as_str().unwrap();
        assert!(detail.starts_with("Failed to fetch image:"));
        assert!(detail.contains("404"));
    }
}
