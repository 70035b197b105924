//! Preview releaser for hosts without revocable preview resources.

use async_trait::async_trait;
use formkern_application::PreviewReleaser;
use formkern_core::AppResult;
use formkern_domain::PreviewHandle;
use tracing::debug;

/// Releaser that consumes handles without side effects.
///
/// Suitable for hosts where previews are plain data and revocation is a
/// no-op; the consumed handle is still logged for audits.
#[derive(Clone)]
pub struct NoopPreviewReleaser;

impl NoopPreviewReleaser {
    /// Creates a new no-op releaser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopPreviewReleaser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreviewReleaser for NoopPreviewReleaser {
    async fn release(&self, handle: PreviewHandle) -> AppResult<()> {
        debug!(handle = handle.as_str(), "released preview handle");
        Ok(())
    }
}
