//! Explicit per-call context.
//!
//! Trace identity and cancellation travel together through every call
//! boundary instead of living in task-local or global state.

use tokio_util::sync::CancellationToken;

use crate::trace::TraceInfo;

/// Ambient context for one logical call.
///
/// Cloning shares the cancellation token, so a clone can be handed to the
/// call while the original cancels it.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    trace: Option<TraceInfo>,
    cancellation: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches trace identifiers inherited from an upstream span.
    pub fn with_trace(mut self, trace: TraceInfo) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Binds the context to an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Trace identifiers carried by this context, if any.
    pub fn trace(&self) -> Option<&TraceInfo> {
        self.trace.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Completes when the context is cancelled.
    pub(crate) async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }
}
