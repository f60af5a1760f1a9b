//! Session binding module
//!
//! Maps opaque session ids to the Slack user who authenticated under them and
//! gates every credential read on that binding.

mod store;
mod types;

pub use store::SessionStore;
pub use types::{BindOutcome, Binding, CredentialRecord, SlackToken};
