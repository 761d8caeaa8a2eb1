//! Static file serving module
//!
//! Handles static file loading, MIME type detection, and response building
//! for the bundled frontend.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve the landing page
///
/// Serves the configured index file from the static directory, falling back
/// to a built-in page when the file is absent.
pub async fn serve_index(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let index_path = Path::new(&state.config.static_files.dir)
        .join(&state.config.static_files.index_file);

    match fs::read(&index_path).await {
        Ok(content) => build_static_file_response(
            &content,
            "text/html; charset=utf-8",
            ctx.if_none_match.as_deref(),
            ctx.is_head,
        ),
        Err(_) => http::response::build_html_response(default_homepage(), ctx.is_head),
    }
}

/// Serve favicon from the static directory
pub async fn serve_favicon(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let favicon_path = Path::new(&state.config.static_files.dir).join("favicon.svg");

    match fs::read(&favicon_path).await {
        Ok(data) => build_static_file_response(
            &data,
            "image/svg+xml",
            ctx.if_none_match.as_deref(),
            ctx.is_head,
        ),
        Err(_) => http::build_404_response(),
    }
}

/// Serve static files under `/static/`
pub async fn serve_directory(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match load_from_directory(&state.config.static_files.dir, ctx.path).await {
        Some((content, content_type)) => build_static_file_response(
            &content,
            content_type,
            ctx.if_none_match.as_deref(),
            ctx.is_head,
        ),
        None => http::build_404_response(),
    }
}

/// Load static file from directory, rejecting path traversal
pub async fn load_from_directory(
    static_dir: &str,
    path: &str,
) -> Option<(Vec<u8>, &'static str)> {
    // Remove the /static/ route prefix and neutralize traversal components
    let clean_path = path
        .trim_start_matches('/')
        .replace("..", "");
    let relative_path = clean_path
        .strip_prefix("static/")
        .unwrap_or(&clean_path);

    if relative_path.is_empty() {
        return None;
    }

    let file_path = Path::new(static_dir).join(relative_path);

    // Security: ensure the resolved path stays within static_dir
    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return None;
        }
    };

    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

/// Built-in fallback landing page
fn default_homepage() -> String {
    String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Image Relay</title>
</head>
<body>
    <h1>Image Relay</h1>
    <p>Image search relay and proxy is running.</p>
    <ul>
        <li><code>POST /search</code> &mdash; JSON body <code>{"query": "...", "max_results": 10}</code></li>
        <li><code>GET /proxy-image?url=&lt;image url&gt;</code> &mdash; normalized JPEG with CORS headers</li>
    </ul>
</body>
</html>"#,
    )
}

/// Build static file response with `ETag` revalidation
fn build_static_file_response(
    data: &[u8],
    content_type: &str,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);

    // Check if client has a cached version
    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    http::response::build_cached_response(
        Bytes::from(data.to_owned()),
        content_type,
        &etag,
        is_head,
    )
}
