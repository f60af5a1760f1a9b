//! get_channels tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use sm_auth::ClientAcquirer;
use sm_core::{RequestContext, SchemaBuilder, Tool, ToolOutcome};
use sm_slack::types::next_cursor;
use sm_slack::{SlackApiClient, SlackError};

use crate::resolve::resolve_channel;
use crate::{PageWalk, default_limit, page_limit};

/// Lists channels, or describes one channel when `channel_id` is given
pub struct ChannelsTool {
    acquirer: ClientAcquirer,
}

impl ChannelsTool {
    pub fn new(acquirer: ClientAcquirer) -> Self {
        Self { acquirer }
    }
}

#[derive(Debug, Deserialize)]
struct ChannelsInput {
    #[serde(default)]
    channel_id: Option<String>,
    /// Comma separated conversation types, Slack defaults to public channels
    #[serde(default)]
    types: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    include_members: bool,
}

/// Every member id of `channel`, following pagination
async fn all_members(client: &SlackApiClient, channel: &str) -> Result<Vec<String>, SlackError> {
    let mut members = Vec::new();
    let mut walk = PageWalk::default();
    let mut cursor: Option<String> = None;
    loop {
        let page = client.conversations_members(channel, cursor.as_deref()).await?;
        members.extend(page.members);
        cursor = walk.advance(next_cursor(&page.response_metadata));
        if cursor.is_none() {
            return Ok(members);
        }
    }
}

#[async_trait]
impl Tool for ChannelsTool {
    fn name(&self) -> &str {
        "get_channels"
    }

    fn description(&self) -> &str {
        "Get Slack channels. With channel_id returns that channel's details \
         (optionally its members), otherwise lists channels filtered by types \
         such as 'public_channel,private_channel' or 'im,mpim'."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::new()
            .string("channel_id", "Channel ID or #name to describe; omit to list", false)
            .string("types", "Conversation types to list (default: public_channel)", false)
            .integer("limit", "Maximum number of channels to return when listing (max 1000)", 100)
            .string("cursor", "Pagination cursor from a previous response", false)
            .boolean("include_members", "Include member IDs when describing a channel", false)
            .build()
    }

    async fn execute(&self, ctx: &RequestContext, input: Value) -> ToolOutcome {
        let slack = self.acquirer.acquire(ctx).await?;
        let input: ChannelsInput = serde_json::from_value(input)?;

        let Some(requested) = input.channel_id.as_deref().filter(|c| !c.is_empty()) else {
            debug!(user_id = %slack.user_id, "get_channels (list)");
            let page = slack
                .client
                .conversations_list(
                    input.types.as_deref().filter(|t| !t.is_empty()),
                    Some(page_limit(input.limit)),
                    input.cursor.as_deref(),
                )
                .await?;
            return Ok(json!({
                "ok": true,
                "channels": page.channels,
                "next_cursor": next_cursor(&page.response_metadata),
            }));
        };

        debug!(user_id = %slack.user_id, channel = %requested, "get_channels (info)");
        let channel_id = resolve_channel(&slack.client, requested).await?;
        let channel = slack.client.conversations_info(&channel_id).await?;

        let mut result = json!({"ok": true, "channel": channel});
        if input.include_members {
            match all_members(&slack.client, &channel_id).await {
                Ok(members) => result["members"] = json!(members),
                Err(e) => {
                    warn!("Failed to get members for channel {}: {}", channel_id, e);
                    let reason = e.api_code().map(str::to_string).unwrap_or_else(|| e.to_string());
                    result["members_error"] = json!(reason);
                }
            }
        }
        Ok(result)
    }
}
