// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Lazy cursor-driven iteration over list endpoints.

use std::fmt;
use std::future::Future;

use futures::Stream;
use futures::future::BoxFuture;
use futures::stream;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// One page returned by a fetch callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items of this page.
    pub items: Vec<T>,
    /// Cursor of the next page; `None` or blank when this is the last page.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page.
    pub const fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }
}

type FetchFuture<T> = BoxFuture<'static, Result<Page<T>, Error>>;
type Fetch<T> = Box<dyn FnMut(CancellationToken, String) -> FetchFuture<T> + Send>;

/// Single-pass iterator over a paginated list endpoint.
///
/// Pages are fetched on demand by calling the fetch callback with the
/// current cursor; an empty cursor requests the first page. Only one page is
/// buffered at a time.
///
/// ```ignore
/// let options = ListCalendarsOptions::default();
/// let mut calendars = client.calendars().list(&ctx, "grant-id", &options);
/// while let Some(calendar) = calendars.next().await? {
///     println!("{}", calendar.name);
/// }
/// ```
pub struct Pager<T> {
    ctx: CancellationToken,
    fetch: Fetch<T>,
    buffer: Vec<T>,
    index: usize,
    cursor: String,
    done: bool,
    error: Option<Error>,
}

impl<T> Pager<T> {
    /// Creates a pager from a cancellation token and a fetch callback.
    ///
    /// The callback receives the token and the cursor (empty for the first
    /// page) and returns the page together with the next cursor.
    pub fn new<F, Fut>(ctx: CancellationToken, mut fetch: F) -> Self
    where
        F: FnMut(CancellationToken, String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Page<T>, Error>> + Send + 'static,
    {
        Self {
            ctx,
            fetch: Box::new(move |ctx, cursor| -> FetchFuture<T> { Box::pin(fetch(ctx, cursor)) }),
            buffer: Vec::new(),
            index: 0,
            cursor: String::new(),
            done: false,
            error: None,
        }
    }

    /// Returns the next item, or `None` once the listing is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the error of a failed page fetch. The error is sticky: every
    /// later call returns it again without fetching.
    pub async fn next(&mut self) -> Result<Option<&T>, Error> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        if self.index < self.buffer.len() {
            self.index += 1;
            return Ok(self.buffer.get(self.index - 1));
        }

        if self.done {
            return Ok(None);
        }

        let page = match (self.fetch)(self.ctx.clone(), self.cursor.clone()).await {
            Ok(page) => page,
            Err(err) => {
                tracing::debug!(cursor = %self.cursor, error = %err, "page fetch failed");
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        self.buffer = page.items;
        self.index = 0;
        if self.buffer.is_empty() {
            self.done = true;
            return Ok(None);
        }

        match page.next_cursor.filter(|c| !c.trim().is_empty()) {
            Some(cursor) => self.cursor = cursor,
            None => self.done = true,
        }

        self.index = 1;
        Ok(self.buffer.first())
    }

    /// Drains the pager into a vector.
    ///
    /// # Errors
    ///
    /// On failure the returned [`CollectError`] carries the items gathered
    /// before the error.
    pub async fn collect(&mut self) -> Result<Vec<T>, CollectError<T>>
    where
        T: Clone,
    {
        let mut items = Vec::new();
        loop {
            match self.next().await {
                Ok(Some(item)) => items.push(item.clone()),
                Ok(None) => return Ok(items),
                Err(source) => return Err(CollectError { items, source }),
            }
        }
    }

    /// Rewinds to the first page, clearing any buffered items and error.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.index = 0;
        self.cursor.clear();
        self.done = false;
        self.error = None;
    }

    /// Converts the pager into a stream of owned items.
    ///
    /// The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, Error>> + Send
    where
        T: Clone + Send + 'static,
    {
        stream::try_unfold(self, |mut pager| async move {
            let item = pager.next().await?.cloned();
            Ok::<_, Error>(item.map(|item| (item, pager)))
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for Pager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("buffer", &self.buffer)
            .field("index", &self.index)
            .field("cursor", &self.cursor)
            .field("done", &self.done)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Failure of [`Pager::collect`], with the items gathered before it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("listing stopped after {} items: {source}", .items.len())]
pub struct CollectError<T> {
    /// Items yielded before the failure.
    pub items: Vec<T>,
    /// The failure.
    #[source]
    pub source: Error,
}

impl<T> From<CollectError<T>> for Error {
    fn from(e: CollectError<T>) -> Self {
        e.source
    }
}
