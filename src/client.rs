use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Uri};
use serde::Serialize;
use tokio::time::sleep;
use tracing::debug;

use crate::body::BodyKind;
use crate::context::CallContext;
use crate::endpoint::format_endpoint;
use crate::error::ClientError;
use crate::options::ClientOptions;
use crate::params::{Headers, Query};
use crate::response::Response;
use crate::trace::{
    DependencyRecord, RandomSpanIds, SpanIdSource, Tracer, TRACEPARENT,
};
use crate::transport::{ReqwestTransport, Transport};
use crate::Result;

/// Retrying, trace-instrumented HTTP client.
///
/// A call names a logical endpoint template, query parameters and an
/// optional payload; the client renders the escaped URL, merges headers,
/// attaches a `traceparent` header and drives the attempt loop through the
/// [`Transport`].
///
/// Cloning is cheap and shares the transport, tracer and span-id source.
/// Configuration is immutable: [`HttpClient::with_options`] on a clone
/// derives an independent client, and in-flight calls keep the
/// configuration they started with.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    tracer: Arc<dyn Tracer>,
    span_ids: Arc<dyn SpanIdSource>,
    default_headers: Headers,
    options: ClientOptions,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Default headers may carry credentials; keep values out of logs.
        let header_names: Vec<&str> =
            self.default_headers.pairs().map(|(name, _)| name).collect();
        f.debug_struct("HttpClient")
            .field("default_headers", &header_names)
            .field("options", &self.options)
            .finish()
    }
}

impl HttpClient {
    /// Creates a client over the default reqwest transport.
    pub fn new(tracer: impl Tracer + 'static) -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::new()),
            tracer: Arc::new(tracer),
            span_ids: Arc::new(RandomSpanIds),
            default_headers: Headers::new(),
            options: ClientOptions::default(),
        }
    }

    /// Swaps in a custom transport.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Headers attached to every request. Caller-supplied headers override
    /// them on key collision.
    pub fn with_default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    /// Swaps in a custom span-identifier source.
    pub fn with_span_ids(mut self, source: impl SpanIdSource + 'static) -> Self {
        self.span_ids = Arc::new(source);
        self
    }

    /// Derives a client with new options.
    ///
    /// The receiver is consumed; clone first to keep the original. In-flight
    /// calls are unaffected.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// HTTP GET.
    pub async fn get(
        &self,
        ctx: &CallContext,
        headers: Headers,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response> {
        self.action(ctx, Method::GET, headers, None, endpoint, &query, params)
            .await
    }

    /// HTTP POST without a body.
    pub async fn post(
        &self,
        ctx: &CallContext,
        headers: Headers,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response> {
        self.action(ctx, Method::POST, headers, None, endpoint, &query, params)
            .await
    }

    /// HTTP PUT without a body.
    pub async fn put(
        &self,
        ctx: &CallContext,
        headers: Headers,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response> {
        self.action(ctx, Method::PUT, headers, None, endpoint, &query, params)
            .await
    }

    /// HTTP PATCH without a body.
    pub async fn patch(
        &self,
        ctx: &CallContext,
        headers: Headers,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response> {
        self.action(ctx, Method::PATCH, headers, None, endpoint, &query, params)
            .await
    }

    /// HTTP DELETE without a body.
    pub async fn delete(
        &self,
        ctx: &CallContext,
        headers: Headers,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response> {
        self.action(ctx, Method::DELETE, headers, None, endpoint, &query, params)
            .await
    }

    /// HTTP POST with a JSON payload.
    pub async fn post_json<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        body: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::POST, headers, BodyKind::Json, body, endpoint, &query, params)
            .await
    }

    /// HTTP PUT with a JSON payload.
    pub async fn put_json<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        body: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::PUT, headers, BodyKind::Json, body, endpoint, &query, params)
            .await
    }

    /// HTTP PATCH with a JSON payload.
    pub async fn patch_json<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        body: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::PATCH, headers, BodyKind::Json, body, endpoint, &query, params)
            .await
    }

    /// HTTP DELETE with a JSON payload.
    pub async fn delete_json<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        body: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::DELETE, headers, BodyKind::Json, body, endpoint, &query, params)
            .await
    }

    /// HTTP POST with an XML payload.
    pub async fn post_xml<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        body: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::POST, headers, BodyKind::Xml, body, endpoint, &query, params)
            .await
    }

    /// HTTP PUT with an XML payload.
    pub async fn put_xml<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        body: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::PUT, headers, BodyKind::Xml, body, endpoint, &query, params)
            .await
    }

    /// HTTP PATCH with an XML payload.
    pub async fn patch_xml<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        body: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::PATCH, headers, BodyKind::Xml, body, endpoint, &query, params)
            .await
    }

    /// HTTP DELETE with an XML payload.
    pub async fn delete_xml<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        body: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::DELETE, headers, BodyKind::Xml, body, endpoint, &query, params)
            .await
    }

    /// HTTP POST with a form-urlencoded payload.
    pub async fn post_form<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        form: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::POST, headers, BodyKind::Form, form, endpoint, &query, params)
            .await
    }

    /// HTTP PUT with a form-urlencoded payload.
    pub async fn put_form<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        form: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::PUT, headers, BodyKind::Form, form, endpoint, &query, params)
            .await
    }

    /// HTTP PATCH with a form-urlencoded payload.
    pub async fn patch_form<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        form: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::PATCH, headers, BodyKind::Form, form, endpoint, &query, params)
            .await
    }

    /// HTTP DELETE with a form-urlencoded payload.
    pub async fn delete_form<T>(
        &self,
        ctx: &CallContext,
        headers: Headers,
        form: &T,
        endpoint: &str,
        query: Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.action_with_body(ctx, Method::DELETE, headers, BodyKind::Form, form, endpoint, &query, params)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn action_with_body<T>(
        &self,
        ctx: &CallContext,
        method: Method,
        headers: Headers,
        kind: BodyKind,
        payload: &T,
        endpoint: &str,
        query: &Query,
        params: &[&str],
    ) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        let encoded = kind.encode(payload)?;
        self.action(
            ctx,
            method,
            headers,
            Some((encoded, kind.content_type())),
            endpoint,
            query,
            params,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn action(
        &self,
        ctx: &CallContext,
        method: Method,
        headers: Headers,
        body: Option<(Bytes, &'static str)>,
        endpoint: &str,
        query: &Query,
        params: &[&str],
    ) -> Result<Response> {
        let url = format_endpoint(endpoint, query, params)?;
        let uri: Uri = url.parse().map_err(http::Error::from)?;

        let (body, content_type) = match body {
            Some((bytes, content_type)) => (Some(bytes), Some(content_type)),
            None => (None, None),
        };
        let header_map = self.merge_headers(&headers, content_type)?;

        self.run_request(ctx, method, uri, header_map, body).await
    }

    /// Client defaults first, then caller headers; insertion replaces per
    /// key, so the caller wins a collision. The content type of an encoded
    /// body is set last.
    fn merge_headers(
        &self,
        extra: &Headers,
        content_type: Option<&'static str>,
    ) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in self.default_headers.pairs().chain(extra.pairs()) {
            let name: HeaderName = name.parse().map_err(http::Error::from)?;
            let value: HeaderValue = value.parse().map_err(http::Error::from)?;
            map.insert(name, value);
        }
        if let Some(content_type) = content_type {
            map.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        Ok(map)
    }

    async fn run_request(
        &self,
        ctx: &CallContext,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<Response> {
        let trace = self.tracer.extract(ctx);
        let host = uri.host().unwrap_or_default().to_owned();
        let operation = match uri.path_and_query() {
            Some(path_and_query) => format!("{method} {path_and_query}"),
            None => format!("{method} {}", uri.path()),
        };

        let retry = &self.options.retry;
        let mut attempt: u32 = 0;

        loop {
            // Fresh span per attempt; on generation failure the ambient
            // parent id stands in rather than failing the call.
            let span_id = self
                .span_ids
                .new_span_id()
                .unwrap_or_else(|_| trace.parent_id.clone());

            let mut request = Request::builder()
                .method(method.clone())
                .uri(uri.clone())
                .body(body.clone().unwrap_or_default())
                .map_err(ClientError::Request)?;
            *request.headers_mut() = headers.clone();
            if let Ok(value) = HeaderValue::from_str(&trace.traceparent(&span_id)) {
                request
                    .headers_mut()
                    .insert(HeaderName::from_static(TRACEPARENT), value);
            }

            debug!(%method, url = %uri, attempt, "sending request");
            let started = SystemTime::now();
            let outcome = tokio::select! {
                _ = ctx.cancelled() => return Err(ClientError::Cancelled),
                outcome = self.transport.send(request) => outcome,
            };
            let finished = SystemTime::now();

            match outcome {
                Err(err) => {
                    self.tracer.report_dependency(
                        ctx,
                        DependencyRecord {
                            span_id,
                            dependency_type: "http",
                            target: host.clone(),
                            operation: operation.clone(),
                            success: false,
                            started_at: started,
                            finished_at: finished,
                            fields: HashMap::from([
                                ("method".to_owned(), method.to_string()),
                                ("error".to_owned(), err.to_string()),
                            ]),
                        },
                    );
                    return Err(ClientError::Transport(err));
                }
                Ok(response) => {
                    let status = response.status();
                    self.tracer.report_dependency(
                        ctx,
                        DependencyRecord {
                            span_id,
                            dependency_type: "http",
                            target: host.clone(),
                            operation: operation.clone(),
                            success: status.is_success(),
                            started_at: started,
                            finished_at: finished,
                            fields: HashMap::from([
                                ("method".to_owned(), method.to_string()),
                                ("statusCode".to_owned(), status.as_u16().to_string()),
                            ]),
                        },
                    );

                    if retry.enabled
                        && retry.is_retriable(status.as_u16())
                        && attempt < retry.retry_count
                    {
                        let delay = retry.backoff_for(attempt);
                        debug!(
                            status = status.as_u16(),
                            delay_ms = delay.as_millis() as u64,
                            "retrying after backoff"
                        );
                        tokio::select! {
                            _ = ctx.cancelled() => return Err(ClientError::Cancelled),
                            _ = sleep(delay) => {}
                        }
                        attempt += 1;
                        continue;
                    }

                    return Ok(Response::new(response));
                }
            }
        }
    }
}
