//! reqwest-backed [`Transport`].
//!
//! Every request races the caller's cancellation token. The response status is
//! checked against [`ACCEPTED_STATUSES`] before the body is read, and a
//! successful body is handed back as JSON without further interpretation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::contract::{RequestBody, Transport};
use crate::error::CubicError;

/// Statuses the cubic API uses for success.
pub const ACCEPTED_STATUSES: [u16; 4] = [200, 201, 301, 304];

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CubicError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CubicError::Transport(e.to_string()))?;
        Ok(Self { http })
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Value, CubicError> {
        let exchange = async {
            let response = request.send().await?;
            interpret(response).await
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Request cancelled before completion");
                Err(CubicError::Timeout)
            }
            result = exchange => result,
        }
    }
}

async fn interpret(response: Response) -> Result<Value, CubicError> {
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "Received response");

    if !ACCEPTED_STATUSES.contains(&status.as_u16()) {
        return Err(CubicError::HttpStatus {
            status: status.as_u16(),
            status_text: status_text(&response),
        });
    }

    let bytes = response.bytes().await?;
    Ok(parse_body(&bytes))
}

/// Reason phrase the server sent. hyper only records it when it differs from
/// the canonical one, so the canonical phrase is the fallback.
fn status_text(response: &Response) -> String {
    let status = response.status();
    match response.extensions().get::<hyper::ext::ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => status
            .canonical_reason()
            .unwrap_or(status.as_str())
            .to_string(),
    }
}

/// Empty bodies (e.g. 304) become `null`; anything that is not JSON is kept as text.
pub(crate) fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Value, CubicError> {
        self.execute(self.http.get(url).headers(headers), cancel).await
    }

    async fn post(
        &self,
        url: &str,
        body: RequestBody,
        mut headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Value, CubicError> {
        let request = match body {
            RequestBody::Json(value) => self.http.post(url).headers(headers).json(&value),
            RequestBody::Multipart(form) => {
                // multipart() writes the same boundary header itself and appends rather than replaces.
                headers.remove(CONTENT_TYPE);
                self.http.post(url).headers(headers).multipart(form)
            }
        };
        self.execute(request, cancel).await
    }

    async fn delete(
        &self,
        url: &str,
        body: Value,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Value, CubicError> {
        self.execute(self.http.delete(url).headers(headers).json(&body), cancel)
            .await
    }
}
