//! Embedded static assets

use axum::extract::Path;
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::{AppError, Result};

/// (file name, content type, body)
const ASSETS: &[(&str, &str, &str)] = &[
    (
        "style.css",
        "text/css; charset=utf-8",
        include_str!("../../../static/style.css"),
    ),
    (
        "app.js",
        "application/javascript; charset=utf-8",
        include_str!("../../../static/app.js"),
    ),
];

/// `GET /static/*file`
pub async fn serve_asset(Path(file): Path<String>) -> Result<impl IntoResponse> {
    let file = file.trim_start_matches('/');
    let (_, content_type, body) = ASSETS
        .iter()
        .find(|(name, _, _)| *name == file)
        .ok_or_else(|| AppError::NotFound(file.to_string()))?;

    Ok(([(header::CONTENT_TYPE, *content_type)], *body))
}
