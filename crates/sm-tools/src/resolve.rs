//! Channel reference resolution

use sm_core::ToolError;
use sm_slack::{SlackApiClient, types::next_cursor};
use tracing::debug;

use crate::PageWalk;

const CHANNEL_TYPES: &str = "public_channel,private_channel";
const LIST_PAGE_SIZE: u32 = 200;

/// Turn `#name` into a channel id by walking every `conversations.list`
/// page. Anything else is taken to already be an id.
pub async fn resolve_channel(client: &SlackApiClient, channel: &str) -> Result<String, ToolError> {
    let channel = channel.trim();
    if channel.is_empty() {
        return Err(ToolError::InvalidInput("channel_id is required".to_string()));
    }

    let Some(name) = channel.strip_prefix('#') else {
        return Ok(channel.to_string());
    };

    let mut walk = PageWalk::default();
    let mut cursor: Option<String> = None;
    loop {
        let page = client
            .conversations_list(Some(CHANNEL_TYPES), Some(LIST_PAGE_SIZE), cursor.as_deref())
            .await?;

        let found = page.channels.iter().find_map(|c| {
            if c.get("name").and_then(|n| n.as_str()) == Some(name) {
                c.get("id").and_then(|id| id.as_str()).map(str::to_string)
            } else {
                None
            }
        });
        if let Some(id) = found {
            debug!("Resolved #{} to {}", name, id);
            return Ok(id);
        }

        cursor = walk.advance(next_cursor(&page.response_metadata));
        if cursor.is_none() {
            break;
        }
    }

    Err(ToolError::NotFound(format!("Channel '{}' not found", name)))
}
