// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Client runtime for the Nylas v3 REST API.
//!
//! The crate provides an authenticated transport with retry and rate-limit
//! tracking, a lazy pager over list endpoints, the OAuth 2.0 URL builders and
//! token flows, and facades for calendars, events, messages and grants.
//!
//! Every network operation takes a [`CancellationToken`]; cancelling it aborts
//! the in-flight attempt and any pending retries.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod auth;
mod client;
mod config;
mod error;
mod http;
mod pager;
mod rate_limit;
mod request;
mod resources;
mod response;

pub use tokio_util::sync::CancellationToken;

pub use crate::auth::{
    AdminConsentUrlConfig, Auth, AuthUrlConfig, CodeExchangeRequest, CustomAuthenticationRequest,
    PkceAuthUrl, ProviderDetectRequest, ProviderDetectResponse, TokenExchangeRequest, TokenInfo,
    TokenResponse,
};
pub use crate::client::NylasClient;
pub use crate::config::{ClientBuilder, ClientConfig, EU_BASE_URL, Region, US_BASE_URL};
pub use crate::error::{ApiError, Error, ErrorKind, Result};
pub use crate::pager::{CollectError, Page, Pager};
pub use crate::rate_limit::RateLimit;
pub use crate::request::{QueryMap, QueryParams, QueryValue, Request, encode_query};
pub use crate::resources::{
    Calendar, Calendars, CreateCalendarRequest, CreateEventRequest, EmailName, Event, Events,
    Grant, Grants, ListCalendarsOptions, ListEventsOptions, ListGrantsOptions,
    ListMessagesOptions, Message, Messages, Participant, SendMessageRequest,
    UpdateCalendarRequest, UpdateEventRequest, UpdateGrantRequest, UpdateMessageRequest, When,
};
pub use crate::response::{DeleteResponse, ListResponse, Response};
