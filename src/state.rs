use std::{collections::HashMap, path::PathBuf};

use crate::{constructor::new_document, media::PendingImage, quiz::QuizDocument};

/// Everything an editing session keeps between commands.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) document: QuizDocument,
    pub(crate) file_path: Option<PathBuf>,
    pub(crate) dirty: bool,
    pub(crate) selected: Option<usize>,
    // keyed by media_url
    pub(crate) pending_images: HashMap<String, PendingImage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(new_document())
    }
}

impl Session {
    pub fn new(document: QuizDocument) -> Self {
        Self {
            document,
            file_path: None,
            dirty: false,
            selected: None,
            pending_images: HashMap::new(),
        }
    }

    /// Swaps in a document that did not come from a file, such as a database export.
    pub fn replace_document(&mut self, document: QuizDocument) {
        *self = Session::new(document);
        self.dirty = true;
    }

    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) {
        self.file_path = Some(path.into());
    }

    pub fn document(&self) -> &QuizDocument {
        &self.document
    }

    pub fn file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn pending_image(&self, media_url: &str) -> Option<&PendingImage> {
        self.pending_images.get(media_url)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_images.len()
    }
}
