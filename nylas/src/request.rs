// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request descriptors and query-parameter encoding.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;

use crate::error::Error;

/// A single value in an option bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Sent as-is; omitted when empty.
    Str(String),
    /// Sent in decimal.
    Int(i64),
    /// Sent as `true` or `false`.
    Bool(bool),
    /// Sent as one repeated key per element.
    List(Vec<String>),
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<&String> for QueryValue {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl From<&[String]> for QueryValue {
    fn from(v: &[String]) -> Self {
        Self::List(v.to_vec())
    }
}

/// Option bag mapping parameter names to values.
pub type QueryMap = BTreeMap<String, QueryValue>;

/// Implemented by list-option records to expose their present fields.
pub trait QueryParams {
    /// Returns the fields that are set, keyed by wire name.
    fn values(&self) -> QueryMap;
}

impl QueryParams for QueryMap {
    fn values(&self) -> QueryMap {
        self.clone()
    }
}

/// Inserts `value` under `key` when it is present.
pub(crate) fn put<V: Into<QueryValue>>(map: &mut QueryMap, key: &str, value: Option<V>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v.into());
    }
}

/// Converts an option bag into URL query pairs.
///
/// Empty strings and empty lists are omitted; lists expand into one pair per
/// element.
#[must_use]
pub fn encode_query(values: &QueryMap) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(values.len());
    for (key, value) in values {
        match value {
            QueryValue::Str(s) if s.is_empty() => {}
            QueryValue::Str(s) => pairs.push((key.clone(), s.clone())),
            QueryValue::Int(i) => pairs.push((key.clone(), i.to_string())),
            QueryValue::Bool(b) => pairs.push((key.clone(), b.to_string())),
            QueryValue::List(items) => {
                pairs.extend(items.iter().map(|item| (key.clone(), item.clone())));
            }
        }
    }
    pairs
}

/// Logical description of one API call.
///
/// The body is serialized once, so every retry sends identical bytes.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Arc<[u8]>>,
}

impl Request {
    /// Creates a request for `path`, which is appended verbatim to the
    /// endpoint base.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Creates a PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Creates a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends the present fields of an options record.
    #[must_use]
    pub fn query(mut self, params: &impl QueryParams) -> Self {
        self.query.extend(encode_query(&params.values()));
        self
    }

    /// Appends one query parameter, skipping empty strings.
    #[must_use]
    pub fn query_pair(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        let mut map = QueryMap::new();
        map.insert(key.to_string(), value.into());
        self.query.extend(encode_query(&map));
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let bytes = serde_json::to_vec(body).map_err(|e| Error::Encode(Arc::new(e)))?;
        self.body = Some(bytes.into());
        Ok(self)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the endpoint base.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Encoded query pairs, in insertion order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Serialized JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_query_type_rules() {
        let mut map = QueryMap::new();
        map.insert("limit".to_string(), 50_i64.into());
        map.insert("offset".to_string(), QueryValue::Int(-1));
        map.insert("unread".to_string(), false.into());
        map.insert("busy".to_string(), true.into());
        map.insert("subject".to_string(), "hello world".into());
        map.insert("empty".to_string(), "".into());
        map.insert(
            "in".to_string(),
            vec!["inbox".to_string(), "sent".to_string()].into(),
        );

        let pairs = encode_query(&map);
        let expected = [
            ("busy", "true"),
            ("in", "inbox"),
            ("in", "sent"),
            ("limit", "50"),
            ("offset", "-1"),
            ("subject", "hello world"),
            ("unread", "false"),
        ];
        assert_eq!(pairs.len(), expected.len());
        for ((k, v), (ek, ev)) in pairs.iter().zip(expected) {
            assert_eq!(k, ek);
            assert_eq!(v, ev);
        }
    }

    #[test]
    fn put_skips_absent_values() {
        let mut map = QueryMap::new();
        put(&mut map, "limit", Some(10_u32));
        put::<String>(&mut map, "cursor", None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("limit"), Some(&QueryValue::Int(10)));
    }

    #[test]
    fn request_json_serializes_once() {
        let request = Request::post("/v3/grants/g/calendars")
            .json(&serde_json::json!({ "name": "Work" }))
            .expect("Failed to encode body");

        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.path(), "/v3/grants/g/calendars");
        assert_eq!(request.body(), Some(br#"{"name":"Work"}"#.as_slice()));

        let retry = request.clone();
        assert_eq!(retry.body(), request.body());
    }

    #[test]
    fn request_query_pair_skips_empty_string() {
        let request = Request::get("/v3/grants")
            .query_pair("email", "")
            .query_pair("limit", 5_u32);
        assert_eq!(
            request.query_pairs(),
            &[("limit".to_string(), "5".to_string())]
        );
    }
}
