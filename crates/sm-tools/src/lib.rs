//! sm-tools: Slack read tools for slack-mcp
//!
//! Every tool obtains its Slack client through [`ClientAcquirer`], so it acts
//! as the user bound to the calling session and nobody else.

use std::collections::HashSet;
use std::sync::Arc;

use sm_auth::ClientAcquirer;
use sm_core::ToolManager;
use tracing::warn;

pub mod channel_messages;
pub mod channels;
pub mod dates;
pub mod query;
pub mod resolve;
pub mod search;
pub mod thread_replies;
pub mod users;

pub use channel_messages::ChannelMessagesTool;
pub use channels::ChannelsTool;
pub use search::SearchMessagesTool;
pub use thread_replies::ThreadRepliesTool;
pub use users::UsersTool;

/// Upper bound Slack accepts for list page sizes
pub(crate) const MAX_PAGE_LIMIT: u32 = 1000;

pub(crate) fn default_limit() -> u32 {
    100
}

/// Clamp a requested page size into `1..=MAX_PAGE_LIMIT`
pub(crate) fn page_limit(requested: u32) -> u32 {
    requested.clamp(1, MAX_PAGE_LIMIT)
}

/// Most pages a single call follows through a paginated list
pub(crate) const MAX_PAGES: usize = 100;

/// Cursor bookkeeping for walking a paginated Slack list.
///
/// The walk ends on an empty cursor, on a cursor Slack already handed out,
/// or once `MAX_PAGES` pages have been fetched.
#[derive(Debug, Default)]
pub(crate) struct PageWalk {
    seen: HashSet<String>,
    pages: usize,
}

impl PageWalk {
    /// Record one fetched page and return the cursor to fetch next
    pub(crate) fn advance(&mut self, next: Option<String>) -> Option<String> {
        self.pages += 1;
        let cursor = next?;
        if self.pages >= MAX_PAGES {
            warn!(pages = self.pages, "Pagination stopped at page limit");
            return None;
        }
        if !self.seen.insert(cursor.clone()) {
            warn!(cursor = %cursor, "Slack repeated a pagination cursor");
            return None;
        }
        Some(cursor)
    }
}

/// Register all Slack tools with the tool manager
pub fn register_slack_tools(manager: &mut ToolManager, acquirer: ClientAcquirer) {
    manager.register(Arc::new(ChannelMessagesTool::new(acquirer.clone())));
    manager.register(Arc::new(ThreadRepliesTool::new(acquirer.clone())));
    manager.register(Arc::new(SearchMessagesTool::new(acquirer.clone())));
    manager.register(Arc::new(UsersTool::new(acquirer.clone())));
    manager.register(Arc::new(ChannelsTool::new(acquirer)));
}
