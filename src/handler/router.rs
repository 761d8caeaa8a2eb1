//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method
//! validation, route matching, and dispatching to the search, proxy and
//! static-file handlers.

use crate::config::AppState;
use crate::error::ApiError;
use crate::handler::{proxy, search, static_files};
use crate::http;
use crate::logger;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context for static file handlers
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let access_log = state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed);

    let mut entry = if access_log {
        let mut e = logger::AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        e.query = req.uri().query().map(ToString::to_string);
        e.http_version = http_version_str(req.version()).to_string();
        e.user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        Some(e)
    } else {
        None
    };

    let response = dispatch(req, &state).await;

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
async fn dispatch(
    req: Request<hyper::body::Incoming>,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let is_head = method == Method::HEAD;

    if method == Method::OPTIONS {
        return http::build_options_response(state.config.http.enable_cors);
    }

    // Health probes first, always fast
    if matches!(path.as_str(), "/healthz" | "/readyz") && matches!(method, Method::GET | Method::HEAD)
    {
        return http::build_health_response("ok");
    }

    match (method, path.as_str()) {
        (Method::POST, "/search") => {
            match read_body(req, state.config.http.max_body_size).await {
                Ok(body) => search::handle(state, &body).await,
                Err(resp) => resp,
            }
        }

        (Method::GET | Method::HEAD, "/proxy-image") => {
            proxy::handle(state, req.uri().query()).await
        }

        (Method::GET | Method::HEAD, "/") => {
            let ctx = context(&path, is_head, &req);
            static_files::serve_index(&ctx, state).await
        }

        (Method::GET | Method::HEAD, "/favicon.ico" | "/favicon.svg") => {
            let ctx = context(&path, is_head, &req);
            static_files::serve_favicon(&ctx, state).await
        }

        (Method::GET | Method::HEAD, p) if p.starts_with("/static/") => {
            let ctx = context(&path, is_head, &req);
            static_files::serve_directory(&ctx, state).await
        }

        // Known paths with the wrong method get a 405 with the right Allow set
        (_, "/search") => http::build_405_response("POST, OPTIONS"),
        (_, "/proxy-image" | "/" | "/favicon.ico" | "/favicon.svg") => {
            http::build_405_response("GET, HEAD, OPTIONS")
        }
        (_, p) if p.starts_with("/static/") => http::build_405_response("GET, HEAD, OPTIONS"),

        _ => http::build_404_response(),
    }
}

/// Build a static-file request context from request headers
fn context<'a>(
    path: &'a str,
    is_head: bool,
    req: &Request<hyper::body::Incoming>,
) -> RequestContext<'a> {
    RequestContext {
        path,
        is_head,
        if_none_match: req
            .headers()
            .get("if-none-match")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
    }
}

/// Collect the request body, enforcing the configured size limit
async fn read_body(
    req: Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Result<Bytes, Response<Full<Bytes>>> {
    if let Some(size) = content_length(&req) {
        if size > max_body_size {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            return Err(http::build_413_response());
        }
    }

    match req.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => Err(ApiError::BadBody(format!("failed to read body: {e}")).into_response()),
    }
}

/// Parse the Content-Length header, ignoring malformed values
fn content_length(req: &Request<hyper::body::Incoming>) -> Option<u64> {
    req.headers()
        .get("content-length")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn http_version_str(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}
