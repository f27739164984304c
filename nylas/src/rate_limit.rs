// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Rate-limit bookkeeping from response headers.

use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use jiff::Timestamp;
use reqwest::header::HeaderMap;

const LIMIT_HEADER: &str = "X-RateLimit-Limit";
const REMAINING_HEADER: &str = "X-RateLimit-Remaining";
const RESET_HEADER: &str = "X-RateLimit-Reset";

/// Rate-limit state reported by the most recent response.
///
/// Fields are zero (and `reset` is the Unix epoch) when the server omitted the
/// corresponding header or sent a malformed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed in the current window.
    pub limit: u64,
    /// Requests left in the current window.
    pub remaining: u64,
    /// When the window resets.
    pub reset: Timestamp,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            limit: 0,
            remaining: 0,
            reset: Timestamp::UNIX_EPOCH,
        }
    }
}

impl RateLimit {
    /// Parses the rate-limit headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let reset = parse_header::<i64>(headers, RESET_HEADER)
            .and_then(|secs| Timestamp::from_second(secs).ok())
            .unwrap_or(Timestamp::UNIX_EPOCH);

        Self {
            limit: parse_header(headers, LIMIT_HEADER).unwrap_or(0),
            remaining: parse_header(headers, REMAINING_HEADER).unwrap_or(0),
            reset,
        }
    }
}

fn parse_header<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Shared holder of the latest [`RateLimit`].
#[derive(Debug, Default)]
pub(crate) struct RateObserver {
    snapshot: Mutex<RateLimit>,
}

impl RateObserver {
    /// Replaces the snapshot with the values in `headers`.
    pub fn observe(&self, headers: &HeaderMap) {
        let parsed = RateLimit::from_headers(headers);
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = parsed;
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> RateLimit {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
