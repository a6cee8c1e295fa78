//! Byte-transparent streaming relay to the generation backend.
//!
//! The upstream body is never buffered: each chunk reqwest hands us is yielded
//! to the caller as-is. The upstream connection lives inside the returned
//! stream, so it is released on every exit path (completion, upstream error,
//! or the caller dropping the body mid-stream).

use std::time::{Duration, Instant};

use async_stream::stream;
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics::{RELAY_FIRST_BYTE_LATENCY, RELAY_IN_FLIGHT, UPSTREAM_FAILURES};
use crate::upstream::{self, Upstream};

/// Content type reported when the upstream does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("upstream {target} is unreachable: {source}")]
    Unreachable {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream {target} did not respond within {waited:?}")]
    Timeout { target: String, waited: Duration },
    #[error("invalid upstream address `{0}`")]
    InvalidUpstream(String),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl RelayError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::Timeout { .. } => "timeout",
            Self::InvalidUpstream(_) => "invalid_upstream",
            Self::Client(_) => "client",
        }
    }
}

pub type RelayBody = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// Head of an upstream response plus its still-unread body.
pub struct RelayResponse {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: RelayBody,
}

#[derive(Clone)]
pub struct Relay {
    client: reqwest::Client,
    default_upstream: Upstream,
    first_byte_timeout: Duration,
}

impl Relay {
    pub fn new(default_upstream: &str, first_byte_timeout: Duration) -> Result<Self, RelayError> {
        let default_upstream = Upstream::parse(default_upstream)
            .ok_or_else(|| RelayError::InvalidUpstream(default_upstream.to_string()))?;

        // No overall request timeout: once bytes flow, the caller owns the deadline.
        let client = reqwest::Client::builder()
            .connect_timeout(first_byte_timeout)
            .build()
            .map_err(RelayError::Client)?;

        Ok(Self {
            client,
            default_upstream,
            first_byte_timeout,
        })
    }

    pub fn default_upstream(&self) -> &Upstream {
        &self.default_upstream
    }

    pub fn target_url(&self, target_override: Option<&str>) -> String {
        upstream::resolve(&self.default_upstream, target_override).generate_url()
    }

    /// Send `payload` upstream and hand back the response as soon as its head arrives.
    pub async fn forward(
        &self,
        payload: Bytes,
        target_override: Option<&str>,
    ) -> Result<RelayResponse, RelayError> {
        let target = self.target_url(target_override);
        let started = Instant::now();

        let request = self
            .client
            .post(&target)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send();

        let response = match tokio::time::timeout(self.first_byte_timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) if source.is_timeout() => {
                return Err(self.fail(RelayError::Timeout {
                    target,
                    waited: self.first_byte_timeout,
                }));
            }
            Ok(Err(source)) => return Err(self.fail(RelayError::Unreachable { target, source })),
            Err(_) => {
                return Err(self.fail(RelayError::Timeout {
                    target,
                    waited: self.first_byte_timeout,
                }));
            }
        };

        RELAY_FIRST_BYTE_LATENCY.observe(started.elapsed().as_secs_f64());

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

        info!(
            upstream = %target,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        Ok(RelayResponse {
            status,
            content_type,
            body: pipe(response, target),
        })
    }

    fn fail(&self, err: RelayError) -> RelayError {
        UPSTREAM_FAILURES.with_label_values(&[err.kind()]).inc();
        warn!(error = %err, "relay failed before streaming");
        err
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    CallerGone,
    Completed,
    UpstreamFailed,
}

// Held by the body stream for as long as the upstream connection is open
struct StreamGuard {
    target: String,
    started: Instant,
    forwarded: u64,
    end: StreamEnd,
}

impl StreamGuard {
    fn new(target: String) -> Self {
        RELAY_IN_FLIGHT.inc();
        Self {
            target,
            started: Instant::now(),
            forwarded: 0,
            end: StreamEnd::CallerGone,
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        RELAY_IN_FLIGHT.dec();
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        match self.end {
            StreamEnd::Completed => debug!(
                upstream = %self.target,
                bytes = self.forwarded,
                elapsed_ms,
                "relay stream completed"
            ),
            StreamEnd::CallerGone => info!(
                upstream = %self.target,
                bytes = self.forwarded,
                elapsed_ms,
                "caller disconnected, upstream connection released"
            ),
            StreamEnd::UpstreamFailed => warn!(
                upstream = %self.target,
                bytes = self.forwarded,
                elapsed_ms,
                "upstream stream aborted"
            ),
        }
    }
}

fn pipe(response: reqwest::Response, target: String) -> RelayBody {
    Box::pin(stream! {
        let mut guard = StreamGuard::new(target);
        let mut chunks = response.bytes_stream();
        let mut end = StreamEnd::Completed;

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    guard.forwarded += bytes.len() as u64;
                    yield Ok(bytes);
                }
                Err(err) => {
                    end = StreamEnd::UpstreamFailed;
                    warn!(upstream = %guard.target, error = %err, "upstream read failed");
                    yield Err(err);
                    break;
                }
            }
        }

        guard.end = end;
    })
}
