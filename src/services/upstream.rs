//! The outbound seam: sending an upload to the OCR service.
//!
//! `Upstream` is the only thing the relay knows about the network. The
//! production implementation posts a multipart form with reqwest; tests swap in
//! fakes that count calls or delay their answer.

use crate::models::{relay::RelayRequest, upload::UploadedFile};
use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use reqwest::{
    Client, header,
    multipart::{Form, Part},
};
use thiserror::Error;
use tracing::debug;

/// Transport-level result of one outbound call, before classification.
#[derive(Debug)]
pub enum UpstreamOutcome {
    /// Upstream answered with some status and body.
    Responded { status: StatusCode, body: Bytes },
    /// No response was obtained.
    Failed(TransportError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    Connect(String),
    /// The request could not even be built or sent from this side.
    #[error("{0}")]
    Setup(String),
}

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: RelayRequest) -> UpstreamOutcome;
}

/// Posts uploads to the configured URL over HTTP.
#[derive(Clone, Debug, Default)]
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Multipart form with the file under field `file`, keeping its filename and MIME type.
pub fn build_form(file: &UploadedFile) -> Result<Form, reqwest::Error> {
    let part = Part::stream_with_length(file.content.clone(), file.size() as u64)
        .file_name(file.filename.clone())
        .mime_str(&file.content_type)?;
    Ok(Form::new().part("file", part))
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: RelayRequest) -> UpstreamOutcome {
        let form = match build_form(&request.file) {
            Ok(form) => form,
            Err(err) => return UpstreamOutcome::Failed(TransportError::Setup(err.to_string())),
        };

        debug!(
            url = %request.url,
            filename = %request.file.filename,
            size = request.file.size(),
            "posting upload upstream"
        );

        let response = match self
            .client
            .post(&request.url)
            .header(header::ACCEPT, "application/json")
            .timeout(request.timeout)
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return UpstreamOutcome::Failed(transport_error(&err, &request)),
        };

        let status = response.status();
        match response.bytes().await {
            Ok(body) => UpstreamOutcome::Responded { status, body },
            Err(err) => UpstreamOutcome::Failed(transport_error(&err, &request)),
        }
    }
}

/// Sort a reqwest failure into the three transport classes.
fn transport_error(err: &reqwest::Error, request: &RelayRequest) -> TransportError {
    if err.is_builder() {
        TransportError::Setup(err.to_string())
    } else if err.is_timeout() {
        TransportError::Timeout(timeout_message(request))
    } else {
        // Connect refusals, DNS failures and resets mid-body all mean the
        // upstream was not usable from here.
        TransportError::Connect(err.to_string())
    }
}

pub fn timeout_message(request: &RelayRequest) -> String {
    format!("timeout of {}ms exceeded", request.timeout.as_millis())
}
