use std::collections::BTreeMap;

use formkern_core::{AppError, AppResult, FieldId, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Opaque handle to a temporary preview resource owned by an attachment.
///
/// Handles are issued by the rendering layer (for example an object URL for
/// an image preview) and must be revoked exactly once. The type is
/// deliberately not `Clone`: a handle moves out of the attachment set on
/// replacement, removal, or teardown, and is then consumed by the releaser,
/// so double-release is unrepresentable.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewHandle(NonEmptyString);

impl PreviewHandle {
    /// Creates a handle from the collaborator-issued token.
    pub fn new(token: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(token)?))
    }

    /// Returns the underlying token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// One file or image payload attached to a form field.
///
/// The engine validates nothing about attachment content beyond presence;
/// cropping, compression, and type checks are the upload collaborator's
/// responsibility.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    field: FieldId,
    file_name: NonEmptyString,
    content_type: NonEmptyString,
    bytes: Vec<u8>,
    preview: Option<PreviewHandle>,
}

impl Attachment {
    /// Creates a validated attachment.
    pub fn new(
        field: FieldId,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
        preview: Option<PreviewHandle>,
    ) -> AppResult<Self> {
        if bytes.is_empty() {
            return Err(AppError::Validation(
                "attachment payload must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            field,
            file_name: NonEmptyString::new(file_name)?,
            content_type: NonEmptyString::new(content_type)?,
            bytes,
            preview,
        })
    }

    /// Returns the field the attachment belongs to.
    #[must_use]
    pub fn field(&self) -> &FieldId {
        &self.field
    }

    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Returns the declared content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Returns the binary payload.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn take_preview(&mut self) -> Option<PreviewHandle> {
        self.preview.take()
    }
}

/// Attachments owned by one form instance, keyed by field.
///
/// The set is the sole owner of every preview handle for the lifetime of
/// the form; the mutating operations hand the displaced handles back to the
/// caller so they can be revoked through the releaser collaborator.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AttachmentSet {
    entries: BTreeMap<FieldId, Attachment>,
}

impl AttachmentSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the attachment for its field.
    ///
    /// Returns the preview handle of the replaced attachment, which the
    /// caller must release.
    pub fn attach(&mut self, attachment: Attachment) -> Option<PreviewHandle> {
        self.entries
            .insert(attachment.field.clone(), attachment)
            .and_then(|mut replaced| replaced.take_preview())
    }

    /// Removes the attachment for a field.
    ///
    /// Returns the removed attachment's preview handle, which the caller
    /// must release.
    pub fn remove(&mut self, field: &FieldId) -> Option<PreviewHandle> {
        self.entries
            .remove(field)
            .and_then(|mut removed| removed.take_preview())
    }

    /// Removes every attachment and yields all preview handles.
    ///
    /// Used on form teardown and reset.
    pub fn drain_previews(&mut self) -> Vec<PreviewHandle> {
        std::mem::take(&mut self.entries)
            .into_values()
            .filter_map(|mut attachment| attachment.take_preview())
            .collect()
    }

    /// Iterates the attachments in field order.
    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.entries.values()
    }

    /// Returns the number of attached payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use formkern_core::FieldId;

    use super::{Attachment, AttachmentSet, PreviewHandle};

    fn attachment(field: &str, preview_token: Option<&str>) -> Option<Attachment> {
        let field = FieldId::new(field).ok()?;
        let preview = match preview_token {
            Some(token) => Some(PreviewHandle::new(token).ok()?),
            None => None,
        };
        Attachment::new(field, "logo.png", "image/png", vec![1, 2, 3], preview).ok()
    }

    #[test]
    fn attach_returns_replaced_preview_handle_once() {
        let mut set = AttachmentSet::new();
        let first = attachment("logo", Some("blob:a"));
        let second = attachment("logo", Some("blob:b"));
        assert!(first.is_some() && second.is_some());
        let (Some(first), Some(second)) = (first, second) else {
            return;
        };

        assert!(set.attach(first).is_none());
        let displaced = set.attach(second);
        assert_eq!(
            displaced.as_ref().map(PreviewHandle::as_str),
            Some("blob:a")
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_yields_handle_and_second_remove_yields_nothing() {
        let mut set = AttachmentSet::new();
        let Some(entry) = attachment("logo", Some("blob:a")) else {
            return;
        };
        let Ok(field) = FieldId::new("logo") else {
            return;
        };

        set.attach(entry);
        assert!(set.remove(&field).is_some());
        assert!(set.remove(&field).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn drain_previews_empties_the_set() {
        let mut set = AttachmentSet::new();
        for (field, token) in [("logo", Some("blob:a")), ("scan", None)] {
            if let Some(entry) = attachment(field, token) {
                set.attach(entry);
            }
        }

        let handles = set.drain_previews();
        assert_eq!(handles.len(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn empty_payload_is_rejected() {
        let Ok(field) = FieldId::new("logo") else {
            return;
        };
        let result = Attachment::new(field, "logo.png", "image/png", Vec::new(), None);
        assert!(result.is_err());
    }
}
