// Actions layer - agent-facing function declarations and their dispatch.

#[path = "docs_actions.rs"]
pub mod docs;

pub use docs::GoogleDocsFunctionHandler;
