use std::collections::BTreeMap;

use async_trait::async_trait;
use formkern_core::{AppResult, FieldId};
use formkern_domain::Attachment;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Owned attachment snapshot handed to the transport.
///
/// Preview handles stay behind in the form session; the transport only
/// needs the payload and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPayload {
    /// Field the payload belongs to.
    pub field: FieldId,
    /// Original file name.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// Binary payload.
    pub bytes: Vec<u8>,
}

impl From<&Attachment> for AttachmentPayload {
    fn from(attachment: &Attachment) -> Self {
        Self {
            field: attachment.field().clone(),
            file_name: attachment.file_name().to_owned(),
            content_type: attachment.content_type().to_owned(),
            bytes: attachment.bytes().to_vec(),
        }
    }
}

/// Resolution of one transport call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportOutcome {
    /// The remote system accepted the submission.
    Accepted(Value),
    /// The remote system rejected specific fields.
    RejectedFields(BTreeMap<FieldId, String>),
    /// The remote system rejected the submission without field detail.
    RejectedMessage(String),
}

/// Remote submission collaborator.
///
/// An `Err` return signals an unrecoverable transport-level fault (network
/// down, malformed response); the orchestrator catches it and reclassifies
/// it as a transport failure instead of letting it escape.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    /// Submits the value tree plus attachments to the remote system.
    async fn submit(
        &self,
        values: &Value,
        attachments: &[AttachmentPayload],
    ) -> AppResult<TransportOutcome>;
}
