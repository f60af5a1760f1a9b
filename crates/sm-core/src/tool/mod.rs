//! Tool system
//!
//! Tools are the operations the agent can invoke. Each call carries a
//! [`RequestContext`](crate::RequestContext) and yields a [`ToolOutcome`].

pub mod definition;
pub mod error;
pub mod manager;
pub mod traits;

pub use definition::{SchemaBuilder, ToolDefinition};
pub use error::{AuthDenial, ToolError};
pub use manager::ToolManager;
pub use traits::{Tool, ToolOutcome, ToolResult, error_payload};
