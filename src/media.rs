use std::{
    fs,
    path::{Path, PathBuf},
};

use uuid::Uuid;

use crate::error::{Error, Result};

/// An image picked for a question, copied into the media folder on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub source: PathBuf,
    pub media_url: String,
}

impl PendingImage {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let media_url = media_url_for(&source);
        Self { source, media_url }
    }

    pub fn target(&self, media_dir: &Path) -> PathBuf {
        media_dir.join(&self.media_url)
    }

    pub fn copy_into(&self, media_dir: &Path) -> Result<PathBuf> {
        let target = self.target(media_dir);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::copy(&self.source, &target).map_err(|e| Error::io(&self.source, e))?;
        log::debug!("Copied {} to {}", self.source.display(), target.display());
        Ok(target)
    }
}

/// `images/question_<8 hex chars><ext>`, relative to the media folder.
pub fn media_url_for(source: &Path) -> String {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let tag = Uuid::new_v4().simple().to_string();
    format!("images/question_{}{}", &tag[..8], ext)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    None,
    Pending(PathBuf),
    Stored(PathBuf),
    Missing(String),
}

pub fn image_status(
    media_url: Option<&str>,
    pending: Option<&PendingImage>,
    media_dir: &Path,
) -> ImageStatus {
    let Some(media_url) = media_url else {
        return ImageStatus::None;
    };
    if let Some(pending) = pending.filter(|p| p.source.exists()) {
        return ImageStatus::Pending(pending.source.clone());
    }
    let stored = media_dir.join(media_url);
    if stored.exists() {
        ImageStatus::Stored(stored)
    } else {
        ImageStatus::Missing(media_url.to_owned())
    }
}
