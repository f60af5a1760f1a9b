//! Slack search query construction

/// Optional modifiers appended to a search query
#[derive(Debug, Clone, Default)]
pub struct SearchFilters<'a> {
    pub from_user: Option<&'a str>,
    pub in_channel: Option<&'a str>,
    /// Already normalized to `YYYY-MM-DD`
    pub after_date: Option<&'a str>,
    pub before_date: Option<&'a str>,
}

/// Join the base text and filters into Slack search syntax.
///
/// Usernames get an `@` and channel names a `#` unless the value is already
/// prefixed or looks like an id (`U...` / `C...`).
pub fn build_search_query(base_query: &str, filters: &SearchFilters<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !base_query.is_empty() {
        parts.push(base_query.to_string());
    }

    if let Some(user) = filters.from_user.filter(|u| !u.is_empty()) {
        if user.starts_with('U') || user.starts_with('@') {
            parts.push(format!("from:{}", user));
        } else {
            parts.push(format!("from:@{}", user));
        }
    }

    if let Some(channel) = filters.in_channel.filter(|c| !c.is_empty()) {
        if channel.starts_with('C') || channel.starts_with('#') {
            parts.push(format!("in:{}", channel));
        } else {
            parts.push(format!("in:#{}", channel));
        }
    }

    if let Some(after) = filters.after_date.filter(|d| !d.is_empty()) {
        parts.push(format!("after:{}", after));
    }

    if let Some(before) = filters.before_date.filter(|d| !d.is_empty()) {
        parts.push(format!("before:{}", before));
    }

    parts.join(" ")
}
