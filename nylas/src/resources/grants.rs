// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::NylasClient;
use crate::error::{Error, ResultExt};
use crate::pager::Pager;
use crate::request::{QueryMap, QueryParams, Request, put};
use crate::resources::offset_pager;
use crate::response::{DeleteResponse, Response};

const GRANTS_PATH: &str = "/v3/grants";

/// An account connected to the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Grant {
    /// Grant id.
    pub id: String,
    /// Provider of the account, e.g. `google`.
    pub provider: String,
    /// `valid` or `invalid`.
    pub grant_status: String,
    /// Email address of the account.
    pub email: Option<String>,
    /// Granted scopes.
    pub scope: Vec<String>,
    /// User agent of the authorizing browser.
    pub user_agent: Option<String>,
    /// IP address of the authorizing browser.
    pub ip: Option<String>,
    /// State passed through the hosted flow.
    pub state: Option<String>,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update, Unix seconds.
    pub updated_at: Option<i64>,
}

/// Options of [`Grants::list`].
///
/// `limit` is the page size; `offset` is where iteration starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListGrantsOptions {
    /// Page size, 10 when unset.
    pub limit: Option<u32>,
    /// Number of grants to skip.
    pub offset: Option<u32>,
    /// Sort field, `created_at` or `updated_at`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub order_by: Option<String>,
    /// Filter by provider.
    pub provider: Option<String>,
    /// Filter by status.
    pub grant_status: Option<String>,
    /// Filter by email address.
    pub email: Option<String>,
    /// Only grants created after this instant, Unix seconds.
    pub since: Option<i64>,
    /// Only grants created before this instant, Unix seconds.
    pub before: Option<i64>,
}

impl QueryParams for ListGrantsOptions {
    fn values(&self) -> QueryMap {
        let mut map = QueryMap::new();
        put(&mut map, "limit", self.limit);
        put(&mut map, "offset", self.offset);
        put(&mut map, "sort_by", self.sort_by.as_ref());
        put(&mut map, "order_by", self.order_by.as_ref());
        put(&mut map, "provider", self.provider.as_ref());
        put(&mut map, "grant_status", self.grant_status.as_ref());
        put(&mut map, "email", self.email.as_ref());
        put(&mut map, "since", self.since);
        put(&mut map, "before", self.before);
        map
    }
}

/// Body of [`Grants::update`]; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateGrantRequest {
    /// Provider settings to replace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Map<String, serde_json::Value>>,
    /// Scopes to replace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<String>>,
}

/// Grant endpoints of the application.
#[derive(Debug, Clone, Copy)]
pub struct Grants<'a> {
    client: &'a NylasClient,
}

impl<'a> Grants<'a> {
    pub(crate) const fn new(client: &'a NylasClient) -> Self {
        Self { client }
    }

    /// Lists grants page by page using `limit` and `offset`.
    #[must_use]
    pub fn list(&self, ctx: &CancellationToken, options: &ListGrantsOptions) -> Pager<Grant> {
        offset_pager(
            self.client,
            ctx,
            GRANTS_PATH.to_string(),
            options.values(),
            (options.limit.unwrap_or(0), options.offset.unwrap_or(0)),
            "grants.list".to_string(),
        )
    }

    /// Returns one grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn find(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
    ) -> Result<Response<Grant>, Error> {
        let req = Request::get(item_path(grant_id));
        self.client
            .execute(ctx, &req)
            .await
            .with_context(|| format!("grants.find({grant_id})"))
    }

    /// Updates the settings or scopes of a grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded or the request fails.
    pub async fn update(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        body: &UpdateGrantRequest,
    ) -> Result<Response<Grant>, Error> {
        let result = async {
            let req = Request::patch(item_path(grant_id)).json(body)?;
            self.client.execute(ctx, &req).await
        };
        result
            .await
            .with_context(|| format!("grants.update({grant_id})"))
    }

    /// Deletes a grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn destroy(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
    ) -> Result<DeleteResponse, Error> {
        let req = Request::delete(item_path(grant_id));
        self.client
            .execute_raw(ctx, &req)
            .await
            .with_context(|| format!("grants.destroy({grant_id})"))
    }
}

fn item_path(grant_id: &str) -> String {
    format!("{GRANTS_PATH}/{grant_id}")
}
