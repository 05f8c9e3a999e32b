//! `resilient-http` is a retrying, trace-instrumented outbound HTTP client.
//!
//! A call names a logical endpoint template (`/users/{}`), query parameters
//! and an optional payload. The crate renders the escaped URL, merges
//! headers over the client defaults, attaches a W3C-style `traceparent`
//! header, executes the request through a pluggable [`Transport`], retries
//! retriable statuses with exponential backoff and reports every attempt to
//! a [`Tracer`].
//!
//! Retry exhaustion is not an error: the last received response is returned
//! as-is and callers inspect the status code themselves.
//!
//! ```no_run
//! use resilient_http::{CallContext, Headers, HttpClient, NoopTracer, Query};
//!
//! # async fn run() -> resilient_http::Result<()> {
//! let client = HttpClient::new(NoopTracer);
//! let ctx = CallContext::new();
//! let response = client
//!     .get(
//!         &ctx,
//!         Headers::new(),
//!         "https://api.example.com/users/{}",
//!         Query::new().append("page", "2"),
//!         &["42"],
//!     )
//!     .await?;
//! println!("status: {}", response.status());
//! # Ok(())
//! # }
//! ```

mod body;
mod client;
mod context;
mod endpoint;
mod error;
mod options;
mod params;
mod response;
mod trace;
mod transport;

pub use body::{BodyKind, EncodeError};
pub use client::HttpClient;
pub use context::CallContext;
pub use endpoint::TemplateError;
pub use error::{BoxError, ClientError};
pub use options::{ClientOptions, RetryPolicy};
pub use params::{Headers, Query};
pub use response::Response;
pub use trace::{
    DependencyRecord, NoopTracer, RandomSpanIds, SpanIdSource, TraceInfo, Tracer,
};
pub use transport::{ReqwestTransport, Transport};

pub type Result<T> = std::result::Result<T, ClientError>;
