//! Shared plumbing for binary bodies: multipart fields in, byte streams out.

use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use futures::TryStreamExt;

use nimbus_core::error::AppError;
use nimbus_core::traits::UploadStream;
use nimbus_service::file::{Media, MediaBody};

/// Maps a multipart parse failure to a client error.
pub fn multipart_error(err: MultipartError) -> AppError {
    AppError::validation(format!("Malformed multipart body: {}", err.body_text()))
}

/// Adapts a multipart field into a blob upload stream.
pub fn field_stream<'a>(field: Field<'a>) -> UploadStream<'a> {
    Box::pin(field.map_err(std::io::Error::other))
}

/// Reads a text field, refusing anything larger than `limit` bytes.
pub async fn read_text_field(mut field: Field<'_>, limit: usize) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buf.len() + chunk.len() > limit {
            return Err(AppError::validation(format!(
                "Field '{name}' exceeds maximum size of {limit} bytes"
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map_err(|_| AppError::validation(format!("Field '{name}' is not valid UTF-8")))
}

/// Builds the HTTP response for a resolved delivery.
pub fn media_response(media: Media) -> Result<Response, AppError> {
    let content_type = media.file.mime_type.clone();
    let disposition = media.content_disposition();
    let accepts_ranges = media.accepts_ranges();

    let mut builder = Response::builder()
        .header(header::CONTENT_DISPOSITION, header_value(&disposition)?)
        .header(header::CACHE_CONTROL, "private, max-age=0");
    if accepts_ranges {
        builder = builder.header(header::ACCEPT_RANGES, "bytes");
    }

    let response = match media.body {
        MediaBody::Full { stream, len } => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, header_value(&content_type)?)
            .header(header::CONTENT_LENGTH, len)
            .body(Body::from_stream(stream)),
        MediaBody::Partial {
            stream,
            range,
            total,
        } => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_TYPE, header_value(&content_type)?)
            .header(header::CONTENT_RANGE, range.content_range(total))
            .header(header::CONTENT_LENGTH, range.size())
            .body(Body::from_stream(stream)),
        MediaBody::Unsatisfiable { total } => builder
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{total}"))
            .body(Body::empty()),
    };

    response.map_err(|e| AppError::internal(format!("Response build failed: {e}")))
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|_| AppError::internal(format!("Invalid header value: {value}")))
}
