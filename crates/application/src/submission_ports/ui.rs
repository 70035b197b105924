use async_trait::async_trait;
use formkern_core::{AppResult, FieldId};
use formkern_domain::PreviewHandle;

/// Rendering-layer collaborator that moves the viewport to a field.
///
/// The focus navigator decides which field to target; this port performs
/// the scroll and focus actions and feeds nothing back into validation.
#[async_trait]
pub trait FocusHandler: Send + Sync {
    /// Scrolls the field's anchor into view.
    async fn scroll_to(&self, field: &FieldId) -> AppResult<()>;

    /// Moves input focus onto the field.
    async fn focus(&self, field: &FieldId) -> AppResult<()>;
}

/// Collaborator that revokes temporary preview resources.
///
/// The handle is consumed; a released handle cannot be released again.
#[async_trait]
pub trait PreviewReleaser: Send + Sync {
    /// Revokes one preview resource.
    async fn release(&self, handle: PreviewHandle) -> AppResult<()>;
}
