// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP transport with authentication, retry and envelope decoding.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::rate_limit::{RateLimit, RateObserver};
use crate::request::Request;
use crate::response::{self, ListResponse, Response};

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Transport shared by every clone of the client.
#[derive(Debug)]
pub(crate) struct HttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) timeout: Duration,
    pub(crate) max_retries: u32,
    pub(crate) retry_wait: Duration,
    pub(crate) rate: RateObserver,
}

/// A response that completed the retry loop, with its body read.
struct Completed {
    request_id: Option<String>,
    body: Vec<u8>,
}

impl HttpClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn rate_limit(&self) -> RateLimit {
        self.rate.snapshot()
    }

    /// Executes a request whose response is a wrapped single object.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<Response<T>, Error> {
        let done = self.complete(ctx, req).await?;
        response::decode_wrapped(&done.body, done.request_id.as_deref())
    }

    /// Executes a request whose response is a wrapped list.
    pub async fn execute_list<T: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<ListResponse<T>, Error> {
        let done = self.complete(ctx, req).await?;
        response::decode_list(&done.body, done.request_id.as_deref())
    }

    /// Executes a request whose response body is the payload itself.
    pub async fn execute_raw<T: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<T, Error> {
        let done = self.complete(ctx, req).await?;
        response::decode_raw(&done.body)
    }

    /// Executes a request and discards the response body.
    pub async fn execute_discard(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<(), Error> {
        self.complete(ctx, req).await.map(|_| ())
    }

    /// Runs the retry loop, observes the final response and maps error
    /// statuses. The body is only returned for successful responses.
    async fn complete(&self, ctx: &CancellationToken, req: &Request) -> Result<Completed, Error> {
        let resp = self.send(ctx, req).await?;
        self.rate.observe(resp.headers());

        let status = resp.status();
        let request_id = resp
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = tokio::select! {
            biased;
            () = ctx.cancelled() => return Err(Error::Cancelled),
            body = resp.bytes() => body,
        };

        if status.as_u16() >= 400 {
            // An unreadable error body still yields an error record.
            let body = body.unwrap_or_else(|e| {
                tracing::debug!(status = status.as_u16(), error = %e, "failed to read error body");
                Default::default()
            });
            let err = response::decode_error(status.as_u16(), request_id.as_deref(), &body);
            tracing::debug!(status = status.as_u16(), kind = %err.kind, "request failed");
            return Err(err.into());
        }

        Ok(Completed {
            request_id,
            body: body?.to_vec(),
        })
    }

    /// Sends `req`, retrying I/O failures, 429 and 5xx until attempts run out.
    ///
    /// Returns the last response when retries are exhausted so the caller can
    /// map its status.
    async fn send(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url_for(req)?;
        let attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            tracing::debug!(attempt, method = %req.method(), %url, "sending request");
            let outcome = tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(Error::Cancelled),
                outcome = self.build(req, url.clone()).send() => outcome,
            };
            let last = attempt + 1 >= attempts;

            let wait = match outcome {
                Err(err) if last => return Err(err.into()),
                Err(err) => {
                    let wait = self.backoff(attempt);
                    tracing::warn!(attempt, error = %err, ?wait, "request failed, retrying");
                    wait
                }
                Ok(resp) => {
                    let status = resp.status();
                    tracing::debug!(attempt, status = status.as_u16(), "received response");
                    if !is_retryable(status) || last {
                        return Ok(resp);
                    }

                    self.rate.observe(resp.headers());
                    let wait = match status {
                        StatusCode::TOO_MANY_REQUESTS => retry_after(resp.headers())
                            .unwrap_or_else(|| self.backoff(attempt)),
                        _ => self.backoff(attempt),
                    };
                    tracing::warn!(
                        attempt,
                        status = status.as_u16(),
                        ?wait,
                        "retryable status, retrying"
                    );

                    // Drain so the connection can be reused.
                    tokio::select! {
                        biased;
                        () = ctx.cancelled() => return Err(Error::Cancelled),
                        _ = resp.bytes() => {},
                    }
                    wait
                }
            };

            tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(wait) => {},
            }
            attempt += 1;
        }
    }

    fn url_for(&self, req: &Request) -> Result<Url, Error> {
        let raw = format!("{}{}", self.base_url, req.path());
        let mut url = Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })?;
        if !req.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(req.query_pairs());
        }
        Ok(url)
    }

    fn build(&self, req: &Request, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(req.method().clone(), url)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(body) = req.body() {
            builder = builder.body(body.to_vec());
        }
        builder
    }

    /// Wait before attempt `attempt + 1`: `retry_wait * 2^attempt`.
    fn backoff(&self, attempt: u32) -> Duration {
        backoff_delay(self.retry_wait, attempt)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt))
}

/// Parses `Retry-After` as whole seconds; other forms are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
