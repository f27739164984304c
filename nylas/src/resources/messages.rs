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

/// An address with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailName {
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An email message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Message id.
    pub id: String,
    /// Grant owning the message.
    pub grant_id: String,
    /// Thread the message belongs to.
    pub thread_id: Option<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Senders.
    pub from: Vec<EmailName>,
    /// Recipients.
    pub to: Vec<EmailName>,
    /// Carbon-copy recipients.
    pub cc: Vec<EmailName>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<EmailName>,
    /// Reply-to addresses.
    pub reply_to: Vec<EmailName>,
    /// Send time, Unix seconds.
    pub date: i64,
    /// Whether the message is unread.
    pub unread: bool,
    /// Whether the message is starred.
    pub starred: bool,
    /// Short plain-text excerpt.
    pub snippet: Option<String>,
    /// HTML or plain-text body.
    pub body: Option<String>,
    /// Folder ids.
    pub folders: Vec<String>,
}

/// Options of [`Messages::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMessagesOptions {
    /// Page size.
    pub limit: Option<u32>,
    /// Cursor of the first page to fetch.
    pub page_token: Option<String>,
    /// Filter by subject.
    pub subject: Option<String>,
    /// Filter by sender addresses.
    pub from: Vec<String>,
    /// Filter by recipient addresses.
    pub to: Vec<String>,
    /// Filter by folder ids, sent as `in`.
    pub in_folders: Vec<String>,
    /// Filter by thread.
    pub thread_id: Option<String>,
    /// Filter by unread status.
    pub unread: Option<bool>,
    /// Filter by starred status.
    pub starred: Option<bool>,
    /// Only messages with attachments.
    pub has_attachment: Option<bool>,
    /// Only messages received before this instant, Unix seconds.
    pub received_before: Option<i64>,
    /// Only messages received after this instant, Unix seconds.
    pub received_after: Option<i64>,
}

impl QueryParams for ListMessagesOptions {
    fn values(&self) -> QueryMap {
        let non_empty = |v: &Vec<String>| (!v.is_empty()).then(|| v.clone());

        let mut map = QueryMap::new();
        put(&mut map, "limit", self.limit);
        put(&mut map, "page_token", self.page_token.as_ref());
        put(&mut map, "subject", self.subject.as_ref());
        put(&mut map, "from", non_empty(&self.from));
        put(&mut map, "to", non_empty(&self.to));
        put(&mut map, "in", non_empty(&self.in_folders));
        put(&mut map, "thread_id", self.thread_id.as_ref());
        put(&mut map, "unread", self.unread);
        put(&mut map, "starred", self.starred);
        put(&mut map, "has_attachment", self.has_attachment);
        put(&mut map, "received_before", self.received_before);
        put(&mut map, "received_after", self.received_after);
        map
    }
}

/// Body of [`Messages::update`]; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateMessageRequest {
    /// Mark read or unread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<bool>,
    /// Star or unstar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    /// Move to these folders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<String>>,
}

/// Body of [`Messages::send`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    /// Recipients.
    pub to: Vec<EmailName>,
    /// Subject line.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject: String,
    /// HTML or plain-text body.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    /// Carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<EmailName>,
    /// Blind carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<EmailName>,
    /// Reply-to addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<EmailName>,
    /// Message this one replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<String>,
    /// Scheduled send time, Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_at: Option<i64>,
}

/// Message endpoints of a grant.
#[derive(Debug, Clone, Copy)]
pub struct Messages<'a> {
    client: &'a NylasClient,
}

impl<'a> Messages<'a> {
    pub(crate) const fn new(client: &'a NylasClient) -> Self {
        Self { client }
    }

    /// Lists the messages of a grant, newest first.
    #[must_use]
    pub fn list(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        options: &ListMessagesOptions,
    ) -> Pager<Message> {
        cursor_pager(
            self.client,
            ctx,
            collection_path(grant_id),
            options.values(),
            format!("messages.list({grant_id})"),
        )
    }

    /// Returns one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn find(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        message_id: &str,
    ) -> Result<Response<Message>, Error> {
        let req = Request::get(item_path(grant_id, message_id));
        self.client
            .execute(ctx, &req)
            .await
            .with_context(|| format!("messages.find({message_id})"))
    }

    /// Updates flags or folders of a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded or the request fails.
    pub async fn update(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        message_id: &str,
        body: &UpdateMessageRequest,
    ) -> Result<Response<Message>, Error> {
        let result = async {
            let req = Request::put(item_path(grant_id, message_id)).json(body)?;
            self.client.execute(ctx, &req).await
        };
        result
            .await
            .with_context(|| format!("messages.update({message_id})"))
    }

    /// Deletes a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn destroy(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        message_id: &str,
    ) -> Result<DeleteResponse, Error> {
        let req = Request::delete(item_path(grant_id, message_id));
        self.client
            .execute_raw(ctx, &req)
            .await
            .with_context(|| format!("messages.destroy({message_id})"))
    }

    /// Sends a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded or the request fails.
    pub async fn send(
        &self,
        ctx: &CancellationToken,
        grant_id: &str,
        body: &SendMessageRequest,
    ) -> Result<Response<Message>, Error> {
        let result = async {
            let req = Request::post(format!("/v3/grants/{grant_id}/messages/send")).json(body)?;
            self.client.execute(ctx, &req).await
        };
        result
            .await
            .with_context(|| format!("messages.send({grant_id})"))
    }
}

fn collection_path(grant_id: &str) -> String {
    format!("/v3/grants/{grant_id}/messages")
}

fn item_path(grant_id: &str, message_id: &str) -> String {
    format!("/v3/grants/{grant_id}/messages/{message_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{QueryValue, encode_query};

    #[test]
    fn list_options_repeat_list_keys() {
        let options = ListMessagesOptions {
            in_folders: vec!["INBOX".to_string(), "SENT".to_string()],
            unread: Some(false),
            ..ListMessagesOptions::default()
        };
        let values = options.values();
        assert!(!values.contains_key("from"));
        assert_eq!(values.get("unread"), Some(&QueryValue::Bool(false)));

        let pairs = encode_query(&values);
        assert_eq!(
            pairs,
            vec![
                ("in".to_string(), "INBOX".to_string()),
                ("in".to_string(), "SENT".to_string()),
                ("unread".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn send_body_skips_empty_fields() {
        let body = SendMessageRequest {
            to: vec![EmailName {
                email: "a@example.com".to_string(),
                name: None,
            }],
            subject: "Hi".to_string(),
            ..SendMessageRequest::default()
        };
        let json = serde_json::to_value(&body).expect("Failed to encode body");
        assert_eq!(
            json,
            serde_json::json!({ "to": [{ "email": "a@example.com" }], "subject": "Hi" })
        );
    }
}
