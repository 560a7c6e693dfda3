//! Embedded front end, served straight from the binary

use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "ui/"]
struct FrontendAssets;

/// Serve the main page
pub async fn index_handler() -> impl IntoResponse {
    match FrontendAssets::get("index.html") {
        Some(content) => Html(content.data.to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, "Front end missing from build").into_response(),
    }
}

/// Serve static assets (JS, CSS)
pub async fn static_handler(
    axum::extract::Path(path): axum::extract::Path<String>,
) -> impl IntoResponse {
    match FrontendAssets::get(&format!("assets/{path}")) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .header(header::CACHE_CONTROL, "public, max-age=3600")
                .body(axum::body::Body::from(content.data.to_vec()))
                .unwrap_or_else(|_| {
                    Response::builder()
                        .status(StatusCode::INTERNAL_SERVER_ERROR)
                        .body(axum::body::Body::empty())
                        .expect("fallback response")
                })
        }
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(axum::body::Body::from("Not found"))
            .expect("404 response"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_embedded() {
        let index = FrontendAssets::get("index.html").unwrap();
        let html = String::from_utf8_lossy(&index.data);
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("/assets/app.js"));
    }

    #[test]
    fn test_assets_embedded() {
        let files: Vec<_> = FrontendAssets::iter().collect();
        assert!(files.iter().any(|f| f.as_ref() == "assets/app.js"));
        assert!(files.iter().any(|f| f.as_ref() == "assets/style.css"));
    }
}
