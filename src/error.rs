use crate::body::EncodeError;
use crate::endpoint::TemplateError;

/// Boxed error used at the collaborator seams (transport, span-id source).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type returned by this crate.
///
/// Retry exhaustion is deliberately absent: when the attempt budget runs out
/// the last received response is returned as a normal [`crate::Response`],
/// and callers inspect the status code themselves.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Endpoint template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// Request body serialization failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The rendered URL or a header did not form a valid request.
    #[error("invalid request: {0}")]
    Request(#[from] http::Error),
    /// Network or request execution error from the transport. Never retried.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// The ambient call context was cancelled during a send or backoff wait.
    #[error("call cancelled")]
    Cancelled,
    /// Response body decoding failure.
    #[error("decode error: {0}")]
    Decode(String),
}
