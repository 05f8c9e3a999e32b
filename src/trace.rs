//! Distributed-tracing collaborators.
//!
//! Every request attempt gets a fresh span identifier and a `traceparent`
//! header composed from the call's trace identity; the attempt's outcome is
//! reported to an external [`Tracer`] as a dependency record. Tracing is a
//! best-effort side channel: identifier-generation failures fall back to the
//! ambient parent id, and nothing on this path can fail the primary request.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::SystemTime;

use rand::RngCore;

use crate::context::CallContext;
use crate::error::BoxError;

/// Name of the propagation header attached to every attempt.
pub(crate) const TRACEPARENT: &str = "traceparent";

/// W3C-style trace identity for one logical call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceInfo {
    /// Format version, `00` for the current W3C layout.
    pub version: String,
    /// 32-hex-char trace identifier shared by all spans of the trace.
    pub trace_id: String,
    /// Span that owns this outbound call on the caller's side.
    pub parent_id: String,
    /// Sampling flags, `01` when the trace is sampled.
    pub flags: String,
}

impl Default for TraceInfo {
    fn default() -> Self {
        Self {
            version: "00".to_owned(),
            trace_id: "0".repeat(32),
            parent_id: "0".repeat(16),
            flags: "01".to_owned(),
        }
    }
}

impl TraceInfo {
    /// Renders the `traceparent` value for one attempt's span.
    pub(crate) fn traceparent(&self, span_id: &str) -> String {
        format!(
            "{}-{}-{}-{}",
            self.version, self.trace_id, span_id, self.flags
        )
    }
}

/// Outcome of a single request attempt.
#[derive(Clone, Debug)]
pub struct DependencyRecord {
    /// Span generated for this attempt.
    pub span_id: String,
    /// Dependency kind, always `"http"` for this crate.
    pub dependency_type: &'static str,
    /// Host of the target service.
    pub target: String,
    /// `METHOD path?query` of the attempt.
    pub operation: String,
    /// True iff a response with a 2xx status was received.
    pub success: bool,
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    /// Extra outcome detail: `method` plus `statusCode` or `error`.
    pub fields: HashMap<String, String>,
}

/// External tracing collaborator.
///
/// Implementations must not block; reports never affect control flow or
/// error propagation of the request they describe.
pub trait Tracer: Send + Sync {
    /// Resolves the trace identity for a call, falling back to
    /// implementation defaults when the context carries none.
    fn extract(&self, ctx: &CallContext) -> TraceInfo;

    /// Receives one outcome record per request attempt, retries included.
    fn report_dependency(&self, ctx: &CallContext, record: DependencyRecord);
}

/// Tracer that keeps context-supplied identity and discards reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn extract(&self, ctx: &CallContext) -> TraceInfo {
        ctx.trace().cloned().unwrap_or_default()
    }

    fn report_dependency(&self, _ctx: &CallContext, _record: DependencyRecord) {}
}

/// Span identifier generator.
pub trait SpanIdSource: Send + Sync {
    /// Produces a fresh low-collision span identifier.
    ///
    /// On error the executor reuses the ambient parent id instead of
    /// failing the request.
    fn new_span_id(&self) -> Result<String, BoxError>;
}

/// Default source: 8 random bytes rendered as lowercase hex.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSpanIds;

impl SpanIdSource for RandomSpanIds {
    fn new_span_id(&self) -> Result<String, BoxError> {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);
        let id = bytes.iter().fold(String::with_capacity(16), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{NoopTracer, RandomSpanIds, SpanIdSource, TraceInfo, Tracer};
    use crate::context::CallContext;

    #[test]
    fn span_ids_are_sixteen_hex_chars() {
        let id = RandomSpanIds.new_span_id().expect("generation must succeed");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn span_ids_are_distinct() {
        let a = RandomSpanIds.new_span_id().expect("must generate");
        let b = RandomSpanIds.new_span_id().expect("must generate");
        assert_ne!(a, b);
    }

    #[test]
    fn traceparent_joins_the_four_fields() {
        let trace = TraceInfo {
            version: "00".to_owned(),
            trace_id: "a".repeat(32),
            parent_id: "b".repeat(16),
            flags: "01".to_owned(),
        };
        let value = trace.traceparent("c0c0c0c0c0c0c0c0");
        assert_eq!(
            value,
            format!("00-{}-c0c0c0c0c0c0c0c0-01", "a".repeat(32))
        );
    }

    #[test]
    fn noop_tracer_prefers_context_identity() {
        let trace = TraceInfo {
            trace_id: "f".repeat(32),
            ..TraceInfo::default()
        };
        let ctx = CallContext::new().with_trace(trace.clone());
        assert_eq!(NoopTracer.extract(&ctx), trace);
        assert_eq!(NoopTracer.extract(&CallContext::new()), TraceInfo::default());
    }
}
