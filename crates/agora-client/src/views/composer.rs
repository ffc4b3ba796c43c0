use std::path::Path;

use agora_shared::constants::{AUTHORS_COLLECTION, MAX_IMAGE_SIZE, POSTS_COLLECTION};
use agora_shared::media::InlineImage;
use agora_shared::{AuthError, Post, PostId, Session, ValidationError};
use agora_store::{DocumentStore, WriteBatch};

use crate::error::Result;
use crate::refresh::RefreshSignal;
use crate::views::stories::AuthorEntry;

/// Post composer. Holds the draft text and optional inline image until
/// submission.
pub struct Composer<S> {
    store: S,
    text: String,
    image: Option<InlineImage>,
    on_created: Option<RefreshSignal>,
}

impl<S: DocumentStore> Composer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            text: String::new(),
            image: None,
            on_created: None,
        }
    }

    /// Trigger `signal` after every successful submission.
    pub fn with_refresh(mut self, signal: RefreshSignal) -> Self {
        self.on_created = Some(signal);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn image(&self) -> Option<&InlineImage> {
        self.image.as_ref()
    }

    /// Attach an image. On rejection the previous attachment is kept.
    pub fn attach_image(&mut self, bytes: &[u8]) -> std::result::Result<&InlineImage, ValidationError> {
        let image = InlineImage::from_bytes(bytes)?;
        Ok(self.image.insert(image))
    }

    /// Attach an image from disk. Oversized files are rejected from their
    /// metadata without being read.
    pub async fn attach_image_file(&mut self, path: &Path) -> Result<&InlineImage> {
        let len = tokio::fs::metadata(path).await?.len();
        if len > MAX_IMAGE_SIZE as u64 {
            return Err(ValidationError::image_too_large(len as usize).into());
        }
        let bytes = tokio::fs::read(path).await?;
        Ok(self.attach_image(&bytes)?)
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// A submission in flight holds the composer mutably, so only the text
    /// decides this.
    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Publish the draft as `viewer`.
    ///
    /// The post and the author's index entry are written in one batch. On
    /// success the draft is cleared and the refresh signal fires; on failure
    /// the draft is kept so the user can retry.
    pub async fn submit(&mut self, viewer: Option<&Session>) -> Result<PostId> {
        let viewer = viewer.ok_or(AuthError::NotSignedIn)?;

        let image_ref = self.image.as_ref().map(|i| i.data_uri().to_string());
        let post = Post::new(viewer, &self.text, image_ref)?;
        let batch = WriteBatch::new()
            .create(POSTS_COLLECTION, post.to_record()?)
            .set(
                AUTHORS_COLLECTION,
                viewer.id.as_str(),
                AuthorEntry::from_session(viewer).to_record()?,
            );

        let ids = self.store.commit(batch).await.map_err(|e| {
            tracing::warn!(error = %e, "failed to publish post");
            e
        })?;
        let id = ids
            .into_iter()
            .next()
            .map(PostId)
            .unwrap_or_default();

        self.text.clear();
        self.image = None;
        tracing::info!(post = %id, author = %viewer.id, "post published");

        if let Some(signal) = &self.on_created {
            signal.trigger();
        }
        Ok(id)
    }
}
