//! Seams between the client core and its collaborators.
//!
//! [`Transport`] is what the client facade calls to reach the network and
//! [`Renderer`] is what the invoice pipeline calls to turn a template into
//! PDF bytes. Both are mocked with `mockall` in tests; the mocks are exported
//! behind the `test-export-mocks` feature so integration tests can use them.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::multipart::Form;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{CubicError, RenderError};

/// Payload of a POST request.
#[derive(Debug)]
pub enum RequestBody {
    Json(Value),
    Multipart(Form),
}

impl RequestBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Multipart(_) => None,
        }
    }
}

/// The three verbs the cubic API uses.
///
/// Implementations return the parsed response body for accepted statuses and
/// must honour `cancel`: once it fires, pending calls fail with
/// [`CubicError::Timeout`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Value, CubicError>;

    async fn post(
        &self,
        url: &str,
        body: RequestBody,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Value, CubicError>;

    async fn delete(
        &self,
        url: &str,
        body: Value,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Value, CubicError>;
}

/// Renders a template identifier with a data record into document bytes.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, template: &str, data: &Value) -> Result<Vec<u8>, RenderError>;
}
