// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::Arc;

/// Convenience alias for results returned by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`].
///
/// Kinds are the values callers compare against, e.g.
/// `err.kind() == ErrorKind::NotFound`. Context added by resource methods does
/// not change the kind.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No API key was configured.
    MissingCredential,
    /// The client configuration is invalid.
    Config,
    /// HTTP 400, or a request that could not be built locally.
    BadRequest,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerError,
    /// Any other HTTP status at or above 400.
    OtherHttp,
    /// Transport-level I/O failure.
    Network,
    /// Malformed envelope or payload.
    Decode,
    /// The caller cancelled the operation.
    Cancelled,
}

impl ErrorKind {
    /// Maps a failing HTTP status to its kind.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500.. => Self::ServerError,
            _ => Self::OtherHttp,
        }
    }

    /// Stable, human-readable name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing-credential",
            Self::Config => "config",
            Self::BadRequest => "bad-request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not-found",
            Self::RateLimited => "rate-limited",
            Self::ServerError => "server-error",
            Self::OtherHttp => "other-http",
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error response returned by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status of the failing response.
    pub status: u16,
    /// Kind derived from `status`.
    pub kind: ErrorKind,
    /// Error type reported by the server, if any.
    pub error_type: Option<String>,
    /// Server-supplied message, or a synthesized one.
    pub message: String,
    /// Correlation id of the failing request.
    pub request_id: Option<String>,
}

impl ApiError {
    /// Builds an error record for `status`, synthesizing a message when the
    /// server did not provide one.
    #[must_use]
    pub fn new(
        status: u16,
        error_type: Option<String>,
        message: Option<String>,
        request_id: Option<String>,
    ) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("request failed with status {status}"));

        Self {
            status,
            kind: ErrorKind::from_status(status),
            error_type,
            message,
            request_id,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.kind, self.message)?;
        if let Some(id) = &self.request_id {
            write!(f, " (request id {id})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Errors returned by the client.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No API key was supplied when building the client.
    #[error("missing API key")]
    MissingCredential,

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The endpoint base and path do not form a valid URL.
    #[error("invalid request URL `{url}`: {source}")]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// Underlying parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// The server answered with an error status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Transport-level failure (connect, timeout, broken body stream).
    #[error("network error: {0}")]
    Network(#[source] Arc<reqwest::Error>),

    /// The response could not be decoded.
    #[error("failed to decode {what}: {source}")]
    Decode {
        /// Which part of the response failed.
        what: &'static str,
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The caller cancelled the operation.
    #[error("request cancelled")]
    Cancelled,

    /// An error annotated with the operation that produced it.
    #[error("{context}: {source}")]
    Context {
        /// Operation description, e.g. `calendars.find(primary)`.
        context: String,
        /// The wrapped error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the kind of this error, looking through any context.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential => ErrorKind::MissingCredential,
            Self::Config(_) => ErrorKind::Config,
            Self::InvalidUrl { .. } | Self::Encode(_) => ErrorKind::BadRequest,
            Self::Api(e) => e.kind,
            Self::Network(_) => ErrorKind::Network,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// Returns true if this error is of `kind`.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// The API error record, if the server answered with an error status.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::Context { source, .. } => source.api_error(),
            _ => None,
        }
    }

    /// HTTP status of the failing response, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|e| e.status)
    }

    /// Correlation id of the failing request, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.api_error().and_then(|e| e.request_id.as_deref())
    }

    /// Wraps the error with an operation description.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn decode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Decode {
            what,
            source: Arc::new(source),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(Arc::new(e))
    }
}

/// Adds operation context to failed results.
pub(crate) trait ResultExt<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}
