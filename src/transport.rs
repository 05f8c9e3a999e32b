//! Transport seam between the executor and the network.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BoxError;

/// Sends one fully-formed request and yields the raw response.
///
/// Implementations own all connection-level behavior (pooling, TLS,
/// timeouts); the executor only sees a buffered response or an opaque
/// error. A transport error terminates the attempt loop immediately — the
/// executor never retries it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, BoxError>;
}

/// Production transport backed by a pooled [`reqwest::Client`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a preconfigured client, e.g. one carrying request timeouts or
    /// proxy settings. Deadlines configured here bound every attempt.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, BoxError> {
        let request = reqwest::Request::try_from(request)?;
        let response = self.http.execute(request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut builder = http::Response::builder().status(status);
        if let Some(map) = builder.headers_mut() {
            *map = headers;
        }
        builder.body(body).map_err(Into::into)
    }
}
