//! get_users tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use sm_auth::ClientAcquirer;
use sm_core::{RequestContext, SchemaBuilder, Tool, ToolOutcome};
use sm_slack::types::next_cursor;

use crate::{default_limit, page_limit};

/// Lists workspace users, or fetches one profile when `user_id` is given
pub struct UsersTool {
    acquirer: ClientAcquirer,
}

impl UsersTool {
    pub fn new(acquirer: ClientAcquirer) -> Self {
        Self { acquirer }
    }
}

#[derive(Debug, Deserialize)]
struct UsersInput {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    cursor: Option<String>,
}

#[async_trait]
impl Tool for UsersTool {
    fn name(&self) -> &str {
        "get_users"
    }

    fn description(&self) -> &str {
        "Get Slack users. With user_id returns that user's profile, otherwise \
         lists workspace members page by page."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::new()
            .string("user_id", "User ID to look up; omit to list users", false)
            .integer("limit", "Maximum number of users to return when listing (max 1000)", 100)
            .string("cursor", "Pagination cursor from a previous response", false)
            .build()
    }

    async fn execute(&self, ctx: &RequestContext, input: Value) -> ToolOutcome {
        let slack = self.acquirer.acquire(ctx).await?;
        let input: UsersInput = serde_json::from_value(input)?;

        match input.user_id.as_deref().filter(|id| !id.is_empty()) {
            Some(user_id) => {
                debug!(user_id = %slack.user_id, target = %user_id, "get_users (info)");
                let user = slack.client.users_info(user_id).await?;
                Ok(json!({"ok": true, "user": user}))
            }
            None => {
                debug!(user_id = %slack.user_id, "get_users (list)");
                let page = slack
                    .client
                    .users_list(page_limit(input.limit), input.cursor.as_deref())
                    .await?;
                Ok(json!({
                    "ok": true,
                    "users": page.members,
                    "next_cursor": next_cursor(&page.response_metadata),
                }))
            }
        }
    }
}
