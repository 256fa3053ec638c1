use serde::Serialize;

use super::avaluo::{Avaluo, DocumentSlot};

/// A candidate file picked by the user
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name, used only for its extension
    pub file_name: String,
    /// Declared MIME type
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Step of the upload workflow currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadPhase {
    #[default]
    Idle,
    Validating,
    Uploading,
    Linking,
}

/// Transient upload-dialog state.
///
/// Opened when a document cell is activated; cleared on success or dismissal.
/// A failed attempt leaves the session open with `error` set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadSession {
    pub is_open: bool,
    pub target: Option<Avaluo>,
    pub slot: Option<DocumentSlot>,
    pub phase: UploadPhase,
    pub is_uploading: bool,
    pub error: Option<String>,
}

impl UploadSession {
    pub fn open(target: Avaluo, slot: DocumentSlot) -> Self {
        Self {
            is_open: true,
            target: Some(target),
            slot: Some(slot),
            phase: UploadPhase::Idle,
            is_uploading: false,
            error: None,
        }
    }

    /// Target record and slot, when the session is open
    pub fn target(&self) -> Option<(&Avaluo, DocumentSlot)> {
        match (self.is_open, self.target.as_ref(), self.slot) {
            (true, Some(avaluo), Some(slot)) => Some((avaluo, slot)),
            _ => None,
        }
    }

    /// Mark a new attempt as started
    pub fn begin(&mut self) {
        self.is_uploading = true;
        self.error = None;
        self.phase = UploadPhase::Validating;
    }

    /// Record a failed attempt; the session stays open for retry
    pub fn fail(&mut self, message: String) {
        self.error = Some(message);
        self.is_uploading = false;
        self.phase = UploadPhase::Idle;
    }
}
