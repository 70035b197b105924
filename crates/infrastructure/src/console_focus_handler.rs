//! Focus handler for development. Logs navigation targets to tracing output.

use async_trait::async_trait;
use formkern_application::FocusHandler;
use formkern_core::{AppResult, FieldId};
use tracing::info;

/// Development focus handler that logs scroll and focus targets.
#[derive(Clone)]
pub struct ConsoleFocusHandler;

impl ConsoleFocusHandler {
    /// Creates a new console focus handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleFocusHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FocusHandler for ConsoleFocusHandler {
    async fn scroll_to(&self, field: &FieldId) -> AppResult<()> {
        info!(field = field.as_str(), "scrolling to field");
        Ok(())
    }

    async fn focus(&self, field: &FieldId) -> AppResult<()> {
        info!(field = field.as_str(), "focusing field");
        Ok(())
    }
}
