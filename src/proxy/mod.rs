//! Image proxy module
//!
//! Fetches a remote image, normalizes it (RGB, bounded dimensions) and
//! re-encodes it as JPEG so the frontend can draw it to a canvas without
//! cross-origin tainting.

mod normalize;

pub use normalize::normalize_to_jpeg;

use std::time::Duration;
use thiserror::Error;

/// Total timeout for the outbound image fetch
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Image proxy pipeline errors
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Fetch(#[from] reqwest::Error),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Build the outbound HTTP client for the proxy
///
/// Redirects are followed (bounded) and the whole fetch is capped at
/// `timeout` so a stalled origin fails the request instead of hanging.
/// Production passes `FETCH_TIMEOUT`.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

/// Fetch a remote image and normalize it to bounded RGB JPEG bytes
///
/// A non-success origin status is treated as a fetch failure. Every error in
/// the pipeline aborts the request; there is no fallback image.
pub async fn fetch_and_normalize(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, ProxyError> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let jpeg = normalize_to_jpeg(&bytes)?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 120, 200]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn test_fetch_and_normalize_returns_jpeg() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/img.png")
            .with_header("content-type", "image/png")
            .with_body(png_bytes(50, 50))
            .create_async()
            .await;

        let client = build_client(FETCH_TIMEOUT).unwrap();
        let url = format!("{}/img.png", server.url());
        let out = fetch_and_normalize(&client, &url).await.unwrap();

        let format = image::guess_format(&out).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_origin_404_is_fetch_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let client = build_client(FETCH_TIMEOUT).unwrap();
        let url = format!("{}/missing.png", server.url());
        let err = fetch_and_normalize(&client, &url).await.unwrap_err();

        assert!(matches!(err, ProxyError::Fetch(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_stalled_origin_times_out() {
        // An origin that accepts the connection but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = build_client(Duration::from_millis(200)).unwrap();
        let url = format!("http://{addr}/slow.jpg");
        let err = fetch_and_normalize(&client, &url).await.unwrap_err();

        let ProxyError::Fetch(inner) = err else {
            panic!("expected a fetch error");
        };
        assert!(inner.is_timeout());
    }

    #[tokio::test]
    async fn test_non_image_body_is_decode_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/page.html")
            .with_body("<html>not an image</html>")
            .create_async()
            .await;

        let client = build_client(FETCH_TIMEOUT).unwrap();
        let url = format!("{}/page.html", server.url());
        let err = fetch_and_normalize(&client, &url).await.unwrap_err();

        assert!(matches!(err, ProxyError::Image(_)));
    }
}
