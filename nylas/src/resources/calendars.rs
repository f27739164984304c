// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::NylasClient;
use crate::error::{Error, ResultExt};
use crate::pager::Pager;
use crate::request::{QueryMap, QueryParams, Request, put};
use crate::resources::cursor_pager;
use crate::response::{DeleteResponse, Response};

/// A calendar of a grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Calendar {
    /// Calendar id; `primary` addresses the default calendar.
    pub id: String,
    /// Grant owning the calendar.
    pub grant_id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Geographic location.
    pub location: Option<String>,
    /// IANA time zone.
    pub timezone: Option<String>,
    /// Whether events can be written.
    pub read_only: bool,
    /// Whether the grant owns the calendar.
    pub is_owned_by_user: bool,
    /// Whether this is the primary calendar.
    pub is_primary: Option<bool>,
    /// Display colour, e.g. `#039BE5`.
    pub hex_color: Option<String>,
    /// Application metadata.
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Options of [`Calendars::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListCalendarsOptions {
    /// Page size.
    pub limit: Option<u32>,
    /// Cursor of the first page to fetch.
    pub page_token: Option<String>,
    /// Filter by a metadata key-value pair, `key:value`.
    pub metadata_pair: Option<String>,
}

impl QueryParams for ListCalendarsOptions {
    fn values(&self) -> QueryMap {
        let mut map = QueryMap::new();
        put(&mut map, "limit", self.limit);
        put(&mut map, "page_token", self.page_token.as_ref());
        put(&mut map, "metadata_pair", self.metadata_pair.as_ref());
        map
    }
}

/// Body of [`Calendars::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateCalendarRequest {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Geographic location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// IANA time zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Application metadata.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Body of [`Calendars::update`]; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateCalendarRequest {
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Geographic location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// IANA time zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Display colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_color: Option<String>,
    /// Application metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Calendar endpoints of a grant.
#[derive(Debug, Clone, Copy)]
pub struct Calendars<'a> {
    client: &'a NylasClient,
}

impl<'a> Calendars<'a> {
    pub(crate) const fn new(client: &'a NylasClient) -> Self {
        Self { client }
    }

    /// Lists the calendars of a grant.
    #[must_use]
    pub fn list(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        options: &ListCalendarsOptions,
    ) -> Pager<Calendar> {
        cursor_pager(
            self.client,
            ctx,
            collection_path(grant_id),
            options.values(),
            format!("calendars.list({grant_id})"),
        )
    }

    /// Returns one calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a missing calendar is
    /// [`ErrorKind::NotFound`](crate::ErrorKind::NotFound).
    pub async fn find(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        calendar_id: &str,
    ) -> Result<Response<Calendar>, Error> {
        let req = Request::get(item_path(grant_id, calendar_id));
        self.client
            .execute(ctx, &req)
            .await
            .with_context(|| format!("calendars.find({calendar_id})"))
    }

    /// Creates a calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded or the request fails.
    pub async fn create(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        body: &CreateCalendarRequest,
    ) -> Result<Response<Calendar>, Error> {
        let result = async {
            let req = Request::post(collection_path(grant_id)).json(body)?;
            self.client.execute(ctx, &req).await
        };
        result
            .await
            .with_context(|| format!("calendars.create({grant_id})"))
    }

    /// Updates a calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded or the request fails.
    pub async fn update(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        calendar_id: &str,
        body: &UpdateCalendarRequest,
    ) -> Result<Response<Calendar>, Error> {
        let result = async {
            let req = Request::put(item_path(grant_id, calendar_id)).json(body)?;
            self.client.execute(ctx, &req).await
        };
        result
            .await
            .with_context(|| format!("calendars.update({calendar_id})"))
    }

    /// Deletes a calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn destroy(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        calendar_id: &str,
    ) -> Result<DeleteResponse, Error> {
        let req = Request::delete(item_path(grant_id, calendar_id));
        self.client
            .execute_raw(ctx, &req)
            .await
            .with_context(|| format!("calendars.destroy({calendar_id})"))
    }
}

fn collection_path(grant_id: &str) -> String {
    format!("/v3/grants/{grant_id}/calendars")
}

fn item_path(grant_id: &str, calendar_id: &str) -> String {
    format!("/v3/grants/{grant_id}/calendars/{calendar_id}")
}
