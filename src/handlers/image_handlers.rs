//! Public photo downloads. Bodies are streamed from the blob store.

use crate::{errors::AppError, services::blob_store::StoredBlob, state::AppState};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};

/// `GET /api/image/props/{filename}`
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let blob = state.blobs.open(&filename).await?;

    let mut response = Response::new(Body::from_stream(blob.body));
    *response.status_mut() = StatusCode::OK;
    set_image_headers(response.headers_mut(), &blob.meta);

    Ok(response)
}

fn set_image_headers(headers: &mut HeaderMap, meta: &StoredBlob) {
    let content_type = meta
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.size_bytes.max(0)));

    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", meta.etag)) {
        headers.insert(header::ETAG, value);
    }

    if let Ok(value) = HeaderValue::from_str(&meta.created_at.to_rfc2822()) {
        headers.insert(header::LAST_MODIFIED, value);
    }
}
