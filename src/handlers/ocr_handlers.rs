//! HTTP handler for `POST /api/ocr`.
//! Reads the multipart upload under a hard size cap, then hands it to the relay.

use crate::{
    RelayState,
    errors::AppError,
    models::{relay::RelayResult, upload::UploadedFile},
    services::relay_service,
};
use axum::{
    extract::{
        State,
        multipart::{Field, Multipart, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use bytes::BytesMut;
use tracing::debug;

const FILE_FIELD: &str = "file";

/// Relay an uploaded image to the OCR service.
///
/// A request that is not multipart at all is treated as carrying no file.
pub async fn process_ocr(
    State(state): State<RelayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<RelayResult, AppError> {
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart, state.config.max_file_size).await?,
        Err(rejection) => {
            debug!(%rejection, "request body is not multipart");
            None
        }
    };
    Ok(relay_service::relay(upload, &state.config, state.upstream.as_ref()).await)
}

/// Pull the `file` part out of the form, enforcing the image-only and size rules.
///
/// Parts under other names, and a `file` part without a filename, are skipped.
pub async fn read_upload(
    mut multipart: Multipart,
    max_file_size: usize,
) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| intake_error(err, max_file_size))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!(name = ?field.name(), "skipping multipart field");
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            debug!("skipping `file` field without a filename");
            continue;
        };

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::invalid_file_type());
        }

        let content = read_capped(field, max_file_size).await?;
        return Ok(Some(UploadedFile::new(filename, content_type, content)));
    }

    Ok(None)
}

async fn read_capped(mut field: Field<'_>, max_file_size: usize) -> Result<BytesMut, AppError> {
    let mut content = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| intake_error(err, max_file_size))?
    {
        if content.len() + chunk.len() > max_file_size {
            return Err(AppError::file_too_large(max_file_size));
        }
        content.extend_from_slice(&chunk);
    }
    Ok(content)
}

fn intake_error(err: MultipartError, max_file_size: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::file_too_large(max_file_size)
    } else {
        AppError::bad_request("Invalid upload", err.body_text())
    }
}
