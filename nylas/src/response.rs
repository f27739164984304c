// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Response envelopes used by the API.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use crate::error::{ApiError, Error};

/// A single object wrapped as `{ "data": ..., "request_id": ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    /// The decoded payload.
    pub data: T,
    /// Correlation id of the request.
    pub request_id: String,
}

/// A list wrapped as `{ "data": [...], "request_id": ..., "next_cursor": ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse<T> {
    /// The decoded page of items.
    pub data: Vec<T>,
    /// Cursor of the next page; `None` on the last page.
    pub next_cursor: Option<String>,
    /// Correlation id of the request.
    pub request_id: String,
}

/// Body returned by delete endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    /// Correlation id of the request.
    #[serde(default)]
    pub request_id: String,
}

/// First decoding phase: the envelope with its payload left undecoded.
#[derive(Debug, Deserialize)]
struct RawEnvelope<'a> {
    #[serde(borrow, default)]
    data: Option<&'a RawValue>,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    next_cursor: Option<String>,
}

impl<'a> RawEnvelope<'a> {
    fn parse(body: &'a [u8]) -> Result<Self, Error> {
        serde_json::from_slice(body).map_err(|e| Error::decode("response envelope", e))
    }

    fn payload<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let raw = self.data.map_or("null", RawValue::get);
        serde_json::from_str(raw).map_err(|e| Error::decode("response data", e))
    }

    fn request_id(&mut self, fallback: Option<&str>) -> String {
        self.request_id
            .take()
            .or_else(|| fallback.map(str::to_string))
            .unwrap_or_default()
    }
}

pub(crate) fn decode_wrapped<T: DeserializeOwned>(
    body: &[u8],
    header_request_id: Option<&str>,
) -> Result<Response<T>, Error> {
    let mut envelope = RawEnvelope::parse(body)?;
    let data = envelope.payload()?;
    Ok(Response {
        data,
        request_id: envelope.request_id(header_request_id),
    })
}

pub(crate) fn decode_list<T: DeserializeOwned>(
    body: &[u8],
    header_request_id: Option<&str>,
) -> Result<ListResponse<T>, Error> {
    let mut envelope = RawEnvelope::parse(body)?;
    let data: Option<Vec<T>> = envelope.payload()?;
    Ok(ListResponse {
        data: data.unwrap_or_default(),
        next_cursor: envelope.next_cursor.take().filter(|c| !c.is_empty()),
        request_id: envelope.request_id(header_request_id),
    })
}

pub(crate) fn decode_raw<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::decode("response body", e))
}

/// Error body, either flat or nested under `error`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
    request_id: Option<String>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

/// Builds the error record for a failing response.
///
/// The `X-Request-Id` header takes precedence over the body's `request_id`.
pub(crate) fn decode_error(
    status: u16,
    header_request_id: Option<&str>,
    body: &[u8],
) -> ApiError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let (error_type, message) = match parsed.error {
        Some(detail) => (
            detail.error_type.or(parsed.error_type),
            detail.message.or(parsed.message),
        ),
        None => (parsed.error_type, parsed.message),
    };
    let request_id = header_request_id
        .map(str::to_string)
        .or(parsed.request_id);

    ApiError::new(status, error_type, message, request_id)
}
