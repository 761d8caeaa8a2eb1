// Search DTO module
// Request/response types for the /search endpoint and the raw provider record

use serde::{Deserialize, Serialize};

/// Client search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

const fn default_max_results() -> usize {
    10
}

/// Raw provider record
///
/// The provider returns loosely structured JSON; every field is optional and
/// unknown fields are ignored. Nothing here is required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawImageResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Normalized search result returned to the client
#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub source: Option<String>,
}

impl From<RawImageResult> for SearchResult {
    /// Explicit per-field extraction: only `title` gets a default, all other
    /// absent fields stay absent.
    fn from(raw: RawImageResult) -> Self {
        Self {
            title: raw.title.unwrap_or_else(|| "No Title".to_string()),
            image_url: raw.image,
            thumbnail_url: raw.thumbnail,
            width: raw.width,
            height: raw.height,
            source: raw.source,
        }
    }
}

/// Response envelope for `/search`
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_max_results() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "cats"}"#).unwrap();
        assert_eq!(req.query, "cats");
        assert_eq!(req.max_results, 10);
    }

    #[test]
    fn test_request_explicit_max_results() {
        let req: SearchRequest =
            serde_json::from_str(r#"{"query": "", "max_results": 50}"#).unwrap();
        assert!(req.query.is_empty());
        assert_eq!(req.max_results, 50);
    }

    #[test]
    fn test_raw_record_all_fields_optional() {
        let raw: RawImageResult = serde_json::from_str("{}").unwrap();
        assert!(raw.title.is_none());
        assert!(raw.image.is_none());
    }

    #[test]
    fn test_raw_record_ignores_unknown_fields() {
        let raw: RawImageResult = serde_json::from_str(
            r#"{"title": "t", "image": "http://x/a.jpg", "url": "http://x", "score": 3}"#,
        )
        .unwrap();
        assert_eq!(raw.title.as_deref(), Some("t"));
        assert_eq!(raw.image.as_deref(), Some("http://x/a.jpg"));
    }

    #[test]
    fn test_missing_title_defaults() {
        let raw: RawImageResult =
            serde_json::from_str(r#"{"image": "http://x/a.jpg", "width": 800}"#).unwrap();
        let result = SearchResult::from(raw);
        assert_eq!(result.title, "No Title");
        assert_eq!(result.image_url.as_deref(), Some("http://x/a.jpg"));
        assert_eq!(result.width, Some(800));
        // Absent fields stay absent, never defaulted to empty strings
        assert!(result.thumbnail_url.is_none());
        assert!(result.height.is_none());
        assert!(result.source.is_none());
    }

    #[test]
    fn test_full_record_maps_field_by_field() {
        let raw: RawImageResult = serde_json::from_str(
            r#"{"title": "A cat", "image": "http://x/cat.jpg", "thumbnail": "http://x/t.jpg",
                "width": 1024, "height": 768, "source": "Bing"}"#,
        )
        .unwrap();
        let result = SearchResult::from(raw);
        assert_eq!(result.title, "A cat");
        assert_eq!(result.thumbnail_url.as_deref(), Some("http://x/t.jpg"));
        assert_eq!(result.height, Some(768));
        assert_eq!(result.source.as_deref(), Some("Bing"));
    }
}
