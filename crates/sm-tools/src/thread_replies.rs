//! get_thread_replies tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use sm_auth::ClientAcquirer;
use sm_core::{RequestContext, SchemaBuilder, Tool, ToolError, ToolOutcome};
use sm_slack::types::next_cursor;

use crate::resolve::resolve_channel;
use crate::{default_limit, page_limit};

pub struct ThreadRepliesTool {
    acquirer: ClientAcquirer,
}

impl ThreadRepliesTool {
    pub fn new(acquirer: ClientAcquirer) -> Self {
        Self { acquirer }
    }
}

#[derive(Debug, Deserialize)]
struct ThreadRepliesInput {
    channel_id: String,
    /// Timestamp of the parent message
    thread_ts: String,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    cursor: Option<String>,
}

#[async_trait]
impl Tool for ThreadRepliesTool {
    fn name(&self) -> &str {
        "get_thread_replies"
    }

    fn description(&self) -> &str {
        "Get the replies in a Slack thread. The first message returned is the parent."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::new()
            .string("channel_id", "Channel ID or name where the thread exists", true)
            .string("thread_ts", "Timestamp of the parent message", true)
            .integer("limit", "Maximum number of replies to return (max 1000)", 100)
            .string("cursor", "Pagination cursor from a previous response", false)
            .build()
    }

    async fn execute(&self, ctx: &RequestContext, input: Value) -> ToolOutcome {
        let slack = self.acquirer.acquire(ctx).await?;
        let input: ThreadRepliesInput = serde_json::from_value(input)?;

        if input.thread_ts.trim().is_empty() {
            return Err(ToolError::InvalidInput("thread_ts is required".to_string()));
        }

        debug!(
            user_id = %slack.user_id,
            channel = %input.channel_id,
            thread_ts = %input.thread_ts,
            "get_thread_replies"
        );

        let channel = resolve_channel(&slack.client, &input.channel_id).await?;
        let page = slack
            .client
            .conversations_replies(
                &channel,
                &input.thread_ts,
                page_limit(input.limit),
                input.cursor.as_deref(),
            )
            .await?;

        Ok(json!({
            "ok": true,
            "channel_id": channel,
            "messages": page.messages,
            "has_more": page.has_more,
            "next_cursor": next_cursor(&page.response_metadata),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{alice, bound_acquirer};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_replies_for_named_channel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channels": [{"id": "C9", "name": "team"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversations.replies"))
            .and(query_param("channel", "C9"))
            .and(query_param("ts", "1700000000.000100"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "messages": [{"ts": "1700000000.000100"}, {"ts": "1700000001.000200"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = ThreadRepliesTool::new(bound_acquirer(&server));
        let out = tool
            .execute(
                &alice(),
                json!({"channel_id": "#team", "thread_ts": "1700000000.000100"}),
            )
            .await
            .unwrap();

        assert_eq!(out["channel_id"], "C9");
        assert_eq!(out["messages"].as_array().unwrap().len(), 2);
        assert_eq!(out["has_more"], false);
        assert!(out["next_cursor"].is_null());
    }

    #[tokio::test]
    async fn test_blank_thread_ts_is_invalid() {
        let server = MockServer::start().await;
        let tool = ThreadRepliesTool::new(bound_acquirer(&server));

        let err = tool
            .execute(&alice(), json!({"channel_id": "C1", "thread_ts": " "}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }
}
