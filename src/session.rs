use std::sync::Arc;

use crate::overlay::{PageSize, RecognizedLine};

/// Snapshot of the loaded document. Lines and page size always come from the
/// same OCR pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSession {
    pub document_id: Option<String>,
    pub document_name: Option<String>,
    pub lines: Vec<RecognizedLine>,
    pub page: PageSize,
}

impl DocumentSession {
    pub fn is_loaded(&self) -> bool {
        self.document_id.is_some()
    }
}

/// Owner of the active document. The only mutations are whole-session
/// replacement and reset.
#[derive(Debug, Default)]
pub struct SessionState {
    current: Arc<DocumentSession>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(
        &mut self,
        document_id: impl Into<String>,
        document_name: Option<String>,
        lines: Vec<RecognizedLine>,
        page: PageSize,
    ) {
        self.current = Arc::new(DocumentSession {
            document_id: Some(document_id.into()),
            document_name,
            lines,
            page,
        });
    }

    pub fn current(&self) -> Arc<DocumentSession> {
        Arc::clone(&self.current)
    }

    pub fn reset(&mut self) {
        self.current = Arc::new(DocumentSession::default());
    }

    pub fn is_current(&self, document_id: &str) -> bool {
        self.current.document_id.as_deref() == Some(document_id)
    }
}
