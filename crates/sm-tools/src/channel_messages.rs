//! get_channel_messages tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use sm_auth::ClientAcquirer;
use sm_core::{RequestContext, SchemaBuilder, Tool, ToolOutcome};
use sm_slack::types::next_cursor;

use crate::resolve::resolve_channel;
use crate::{default_limit, page_limit};

/// Reads a page of channel history as the session's user
pub struct ChannelMessagesTool {
    acquirer: ClientAcquirer,
}

impl ChannelMessagesTool {
    pub fn new(acquirer: ClientAcquirer) -> Self {
        Self { acquirer }
    }
}

#[derive(Debug, Deserialize)]
struct ChannelMessagesInput {
    /// Channel id or `#name`
    channel_id: String,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    cursor: Option<String>,
}

#[async_trait]
impl Tool for ChannelMessagesTool {
    fn name(&self) -> &str {
        "get_channel_messages"
    }

    fn description(&self) -> &str {
        "Get messages from a Slack channel the authenticated user can read. \
         Accepts a channel id (C123...) or a #name. Returns messages newest first \
         with a cursor for the next page."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::new()
            .string("channel_id", "Channel ID or name (e.g. 'C1234567890' or '#general')", true)
            .integer("limit", "Maximum number of messages to return (max 1000)", 100)
            .string("cursor", "Pagination cursor from a previous response", false)
            .build()
    }

    async fn execute(&self, ctx: &RequestContext, input: Value) -> ToolOutcome {
        let slack = self.acquirer.acquire(ctx).await?;
        let input: ChannelMessagesInput = serde_json::from_value(input)?;

        debug!(user_id = %slack.user_id, channel = %input.channel_id, "get_channel_messages");

        let channel = resolve_channel(&slack.client, &input.channel_id).await?;
        let page = slack
            .client
            .conversations_history(&channel, page_limit(input.limit), input.cursor.as_deref())
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
