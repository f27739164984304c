// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Client handle shared by every resource facade.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::auth::Auth;
use crate::config::{ClientBuilder, ClientConfig};
use crate::error::Error;
use crate::http::HttpClient;
use crate::rate_limit::RateLimit;
use crate::request::Request;
use crate::resources::{Calendars, Events, Grants, Messages};
use crate::response::{ListResponse, Response};

/// Client for the Nylas v3 API.
///
/// Cloning is cheap; clones share the HTTP connection pool and the rate-limit
/// snapshot.
///
/// # Example
///
/// ```ignore
/// use nylas::{CancellationToken, NylasClient};
///
/// # async fn example() -> Result<(), nylas::Error> {
/// let client = NylasClient::new("nyk_v0_...")?;
/// let ctx = CancellationToken::new();
///
/// let calendar = client.calendars().find(&ctx, "grant-id", "primary").await?;
/// println!("{}", calendar.data.name);
/// println!("{:?}", client.rate_limit());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NylasClient {
    http: Arc<HttpClient>,
}

impl NylasClient {
    pub(crate) fn from_http(http: HttpClient) -> Self {
        Self {
            http: Arc::new(http),
        }
    }

    /// Starts building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Creates a client for the US region with default retry settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::builder().api_key(api_key).build()
    }

    /// Creates a client from a deserialized configuration.
    ///
    /// # Errors
    ///
    /// See [`ClientBuilder::build`].
    pub fn from_config(config: ClientConfig) -> Result<Self, Error> {
        ClientBuilder::from(config).build()
    }

    /// Endpoint base, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    pub(crate) fn api_key(&self) -> &str {
        self.http.api_key()
    }

    /// Rate-limit figures of the most recent response seen by any clone.
    #[must_use]
    pub fn rate_limit(&self) -> RateLimit {
        self.http.rate_limit()
    }

    /// Executes a request whose response wraps a single object.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries, the server
    /// answers with an error status, decoding fails, or `ctx` is cancelled.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<Response<T>, Error> {
        self.http.execute(ctx, req).await
    }

    /// Executes a request whose response wraps a list.
    ///
    /// # Errors
    ///
    /// See [`NylasClient::execute`].
    pub async fn execute_list<T: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<ListResponse<T>, Error> {
        self.http.execute_list(ctx, req).await
    }

    /// Executes a request whose response body is the payload itself.
    ///
    /// # Errors
    ///
    /// See [`NylasClient::execute`].
    pub async fn execute_raw<T: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<T, Error> {
        self.http.execute_raw(ctx, req).await
    }

    /// Executes a request and ignores the response body.
    ///
    /// # Errors
    ///
    /// Same as [`NylasClient::execute`], except that the body is never decoded.
    pub async fn execute_discard(
        &self,
        ctx: &CancellationToken,
        req: &Request,
    ) -> Result<(), Error> {
        self.http.execute_discard(ctx, req).await
    }

    /// OAuth URL builders and token flows.
    #[must_use]
    pub const fn auth(&self) -> Auth<'_> {
        Auth::new(self)
    }

    /// Calendars of a grant.
    #[must_use]
    pub const fn calendars(&self) -> Calendars<'_> {
        Calendars::new(self)
    }

    /// Events of a grant.
    #[must_use]
    pub const fn events(&self) -> Events<'_> {
        Events::new(self)
    }

    /// Messages of a grant.
    #[must_use]
    pub const fn messages(&self) -> Messages<'_> {
        Messages::new(self)
    }

    /// Grants of the application.
    #[must_use]
    pub const fn grants(&self) -> Grants<'_> {
        Grants::new(self)
    }
}
