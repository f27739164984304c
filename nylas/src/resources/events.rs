// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::NylasClient;
use crate::error::{Error, ResultExt};
use crate::pager::Pager;
use crate::request::{QueryMap, QueryParams, Request, put};
use crate::resources::cursor_pager;
use crate::response::{DeleteResponse, Response};

/// Time span of an event.
///
/// Timed events use `start_time`/`end_time` (Unix seconds); all-day events use
/// `date` or `start_date`/`end_date` (`YYYY-MM-DD`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct When {
    /// Start, Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// End, Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// IANA time zone of the start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_timezone: Option<String>,
    /// IANA time zone of the end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timezone: Option<String>,
    /// Single all-day date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// First day of a multi-day span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Last day of a multi-day span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// `timespan`, `date` or `datespan`; set by the server.
    #[serde(skip_serializing)]
    pub object: Option<String>,
}

/// Attendee of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Participant {
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `yes`, `no`, `maybe` or `noreply`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Reply comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// An event in a calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Event id.
    pub id: String,
    /// Grant owning the event.
    pub grant_id: String,
    /// Calendar holding the event.
    pub calendar_id: String,
    /// Title.
    pub title: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// When the event happens.
    pub when: When,
    /// Attendees.
    pub participants: Vec<Participant>,
    /// Whether the event blocks free/busy time.
    pub busy: bool,
    /// Whether the event can be edited.
    pub read_only: bool,
    /// `confirmed`, `tentative` or `cancelled`.
    pub status: Option<String>,
    /// Link to the event in the provider UI.
    pub html_link: Option<String>,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update, Unix seconds.
    pub updated_at: i64,
}

/// Options of [`Events::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEventsOptions {
    /// Page size.
    pub limit: Option<u32>,
    /// Cursor of the first page to fetch.
    pub page_token: Option<String>,
    /// Filter by title.
    pub title: Option<String>,
    /// Filter by location.
    pub location: Option<String>,
    /// Only events ending after this instant, Unix seconds.
    pub start: Option<i64>,
    /// Only events starting before this instant, Unix seconds.
    pub end: Option<i64>,
    /// Include cancelled events.
    pub show_cancelled: Option<bool>,
    /// Expand recurring events into occurrences.
    pub expand_recurring: Option<bool>,
    /// Filter by busy status.
    pub busy: Option<bool>,
}

impl QueryParams for ListEventsOptions {
    fn values(&self) -> QueryMap {
        let mut map = QueryMap::new();
        put(&mut map, "limit", self.limit);
        put(&mut map, "page_token", self.page_token.as_ref());
        put(&mut map, "title", self.title.as_ref());
        put(&mut map, "location", self.location.as_ref());
        put(&mut map, "start", self.start);
        put(&mut map, "end", self.end);
        put(&mut map, "show_cancelled", self.show_cancelled);
        put(&mut map, "expand_recurring", self.expand_recurring);
        put(&mut map, "busy", self.busy);
        map
    }
}

/// Body of [`Events::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateEventRequest {
    /// When the event happens.
    pub when: When,
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Attendees.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<Participant>,
    /// Whether the event blocks free/busy time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy: Option<bool>,
}

/// Body of [`Events::update`]; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateEventRequest {
    /// When the event happens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<When>,
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Attendees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
    /// Whether the event blocks free/busy time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy: Option<bool>,
}

/// Event endpoints of a grant. Every call is scoped to one calendar.
#[derive(Debug, Clone, Copy)]
pub struct Events<'a> {
    client: &'a NylasClient,
}

impl<'a> Events<'a> {
    pub(crate) const fn new(client: &'a NylasClient) -> Self {
        Self { client }
    }

    /// Lists the events of a calendar.
    #[must_use]
    pub fn list(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        calendar_id: &str,
        options: &ListEventsOptions,
    ) -> Pager<Event> {
        let mut values = options.values();
        put(&mut values, "calendar_id", Some(calendar_id));
        cursor_pager(
            self.client,
            ctx,
            collection_path(grant_id),
            values,
            format!("events.list({calendar_id})"),
        )
    }

    /// Returns one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn find(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<Response<Event>, Error> {
        let req =
            Request::get(item_path(grant_id, event_id)).query_pair("calendar_id", calendar_id);
        self.client
            .execute(ctx, &req)
            .await
            .with_context(|| format!("events.find({event_id})"))
    }

    /// Creates an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded or the request fails.
    pub async fn create(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        calendar_id: &str,
        body: &CreateEventRequest,
    ) -> Result<Response<Event>, Error> {
        let result = async {
            let req = Request::post(collection_path(grant_id))
                .query_pair("calendar_id", calendar_id)
                .json(body)?;
            self.client.execute(ctx, &req).await
        };
        result
            .await
            .with_context(|| format!("events.create({calendar_id})"))
    }

    /// Updates an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded or the request fails.
    pub async fn update(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        calendar_id: &str,
        event_id: &str,
        body: &UpdateEventRequest,
    ) -> Result<Response<Event>, Error> {
        let result = async {
            let req = Request::put(item_path(grant_id, event_id))
                .query_pair("calendar_id", calendar_id)
                .json(body)?;
            self.client.execute(ctx, &req).await
        };
        result
            .await
            .with_context(|| format!("events.update({event_id})"))
    }

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn destroy(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<DeleteResponse, Error> {
        let req =
            Request::delete(item_path(grant_id, event_id)).query_pair("calendar_id", calendar_id);
        self.client
            .execute_raw(ctx, &req)
            .await
            .with_context(|| format!("events.destroy({event_id})"))
    }
}

fn collection_path(grant_id: &str) -> String {
    format!("/v3/grants/{grant_id}/events")
}

fn item_path(grant_id: &str, event_id: &str) -> String {
    format!("/v3/grants/{grant_id}/events/{event_id}")
}
