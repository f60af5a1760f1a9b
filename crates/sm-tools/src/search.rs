//! search_messages tool
//!
//! Builds a Slack search query from free text plus structured filters. Slack
//! has no sort parameters for `search.messages`, so a timestamp sort is
//! applied to the returned page only.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use sm_auth::ClientAcquirer;
use sm_core::{RequestContext, SchemaBuilder, Tool, ToolError, ToolOutcome};

use crate::dates::parse_date;
use crate::query::{SearchFilters, build_search_query};

const MAX_SEARCH_COUNT: u32 = 100;

pub struct SearchMessagesTool {
    acquirer: ClientAcquirer,
}

impl SearchMessagesTool {
    pub fn new(acquirer: ClientAcquirer) -> Self {
        Self { acquirer }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SortBy {
    #[default]
    Relevance,
    Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SortOrder {
    #[default]
    Desc,
    Asc,
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    #[serde(default)]
    query: String,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default)]
    from_user: Option<String>,
    #[serde(default)]
    in_channel: Option<String>,
    #[serde(default)]
    after_date: Option<String>,
    #[serde(default)]
    before_date: Option<String>,
    #[serde(default)]
    sort_by: SortBy,
    #[serde(default)]
    sort_order: SortOrder,
}

fn default_count() -> u32 {
    20
}

fn default_page() -> u32 {
    1
}

/// Parse an optional date filter, rejecting values in neither accepted form
fn date_filter(field: &str, value: Option<&str>) -> Result<Option<String>, ToolError> {
    match value.filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| ToolError::InvalidInput(format!("Invalid {} format: {}", field, raw))),
    }
}

/// Numeric value of a match's `ts`, 0 when absent or unparsable
fn match_ts(m: &Value) -> f64 {
    match m.get("ts") {
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn sort_by_timestamp(matches: &mut [Value], order: SortOrder) {
    matches.sort_by(|a, b| {
        let ord: Ordering = match_ts(a).total_cmp(&match_ts(b));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[async_trait]
impl Tool for SearchMessagesTool {
    fn name(&self) -> &str {
        "search_messages"
    }

    fn description(&self) -> &str {
        "Search messages across every conversation the authenticated user can see. \
         Filters: from_user ('U123' or '@john'), in_channel ('C123' or '#general'), \
         after_date / before_date (YYYY-MM-DD or relative like '7d', '2w', '1m', '1y')."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::new()
            .string("query", "Search text (may be empty when filters are given)", false)
            .integer("count", "Results per page (max 100)", 20)
            .integer("page", "Page number", 1)
            .string("from_user", "Only messages from this user ID or username", false)
            .string("in_channel", "Only messages in this channel ID or name", false)
            .string("after_date", "Only messages after this date (YYYY-MM-DD or relative)", false)
            .string("before_date", "Only messages before this date (YYYY-MM-DD or relative)", false)
            .string_enum("sort_by", "Result ordering", &["relevance", "timestamp"], "relevance")
            .string_enum("sort_order", "Sort direction", &["desc", "asc"], "desc")
            .build()
    }

    async fn execute(&self, ctx: &RequestContext, input: Value) -> ToolOutcome {
        let slack = self.acquirer.acquire(ctx).await?;
        let input: SearchInput = serde_json::from_value(input)?;

        let after = date_filter("after_date", input.after_date.as_deref())?;
        let before = date_filter("before_date", input.before_date.as_deref())?;

        let filters = SearchFilters {
            from_user: input.from_user.as_deref(),
            in_channel: input.in_channel.as_deref(),
            after_date: after.as_deref(),
            before_date: before.as_deref(),
        };
        let query = build_search_query(input.query.trim(), &filters);
        if query.is_empty() {
            return Err(ToolError::InvalidInput(
                "query or at least one filter is required".to_string(),
            ));
        }

        debug!(user_id = %slack.user_id, query = %query, "search_messages");

        let response = slack
            .client
            .search_messages(&query, input.count.clamp(1, MAX_SEARCH_COUNT), input.page.max(1))
            .await?;

        let results = response.messages;
        let page = results.page();
        let page_count = results.page_count();
        let mut matches = results.matches;
        if input.sort_by == SortBy::Timestamp {
            sort_by_timestamp(&mut matches, input.sort_order);
        }

        Ok(json!({
            "ok": true,
            "query": query,
            "filters": {
                "from_user": input.from_user,
                "in_channel": input.in_channel,
                "after_date": after,
                "before_date": before,
                "sort_by": input.sort_by,
                "sort_order": input.sort_order,
            },
            "matches": matches,
            "total": results.total,
            "page": page,
            "page_count": page_count,
        }))
    }
}
