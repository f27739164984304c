// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Resource facades built on the shared transport.

mod calendars;
mod events;
mod grants;
mod messages;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::client::NylasClient;
use crate::error::ResultExt;
use crate::pager::{Page, Pager};
use crate::request::{QueryMap, QueryValue, Request};

pub use crate::resources::calendars::{
    Calendar, Calendars, CreateCalendarRequest, ListCalendarsOptions, UpdateCalendarRequest,
};
pub use crate::resources::events::{
    CreateEventRequest, Event, Events, ListEventsOptions, Participant, UpdateEventRequest, When,
};
pub use crate::resources::grants::{Grant, Grants, ListGrantsOptions, UpdateGrantRequest};
pub use crate::resources::messages::{
    EmailName, ListMessagesOptions, Message, Messages, SendMessageRequest, UpdateMessageRequest,
};

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pager over an endpoint that returns `next_cursor` and accepts `page_token`.
///
/// A `page_token` already present in `params` is used for the first page.
fn cursor_pager<T>(
    client: &NylasClient,
    ctx: &CancellationToken,
    path: String,
    params: QueryMap,
    context: String,
) -> Pager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let client = client.clone();
    Pager::new(ctx.clone(), move |ctx, cursor| {
        let mut values = params.clone();
        if !cursor.is_empty() {
            values.insert("page_token".to_string(), QueryValue::Str(cursor));
        }
        let req = Request::get(path.clone()).query(&values);
        let client = client.clone();
        let context = context.clone();
        async move {
            let resp = client
                .execute_list::<T>(&ctx, &req)
                .await
                .with_context(|| context)?;
            Ok(Page::new(resp.data, resp.next_cursor))
        }
    })
}

/// Pager over an endpoint paginated by `limit` and `offset`.
///
/// The next offset travels as the cursor. Iteration ends on the first page
/// shorter than `limit`.
fn offset_pager<T>(
    client: &NylasClient,
    ctx: &CancellationToken,
    path: String,
    params: QueryMap,
    (limit, start): (u32, u32),
    context: String,
) -> Pager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let client = client.clone();
    let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
    Pager::new(ctx.clone(), move |ctx, cursor| {
        let offset = cursor.parse::<u64>().unwrap_or(u64::from(start));
        let mut values = params.clone();
        values.insert("limit".to_string(), limit.into());
        values.insert(
            "offset".to_string(),
            QueryValue::Int(i64::try_from(offset).unwrap_or(i64::MAX)),
        );
        let req = Request::get(path.clone()).query(&values);
        let client = client.clone();
        let context = context.clone();
        async move {
            let resp = client
                .execute_list::<T>(&ctx, &req)
                .await
                .with_context(|| context)?;
            let count = resp.data.len() as u64;
            let next = (count >= u64::from(limit)).then(|| (offset + count).to_string());
            Ok(Page::new(resp.data, next))
        }
    })
}
