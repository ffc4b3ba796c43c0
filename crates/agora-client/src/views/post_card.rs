use agora_shared::constants::POSTS_COLLECTION;
use agora_shared::{Comment, Post, PostId, Session, UserId};
use agora_store::{DocumentStore, FieldOp};
use serde_json::Value;

use crate::error::Result;

/// Interaction state of one post: likes, comments and whether the comment
/// section is expanded.
///
/// Likes and comments update locally before the store write resolves. A
/// failed write is logged and returned, but the local change stays.
#[derive(Debug, Clone, PartialEq)]
pub struct PostCard {
    post: Post,
    show_comments: bool,
}

impl PostCard {
    pub fn new(post: Post) -> Self {
        Self {
            post,
            show_comments: false,
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn id(&self) -> &PostId {
        &self.post.id
    }

    pub fn is_liked(&self, viewer: &UserId) -> bool {
        self.post.is_liked_by(viewer)
    }

    pub fn like_count(&self) -> usize {
        self.post.like_count()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.post.comments
    }

    pub fn comment_count(&self) -> usize {
        self.post.comments.len()
    }

    pub fn show_comments(&self) -> bool {
        self.show_comments
    }

    pub fn toggle_comments(&mut self) {
        self.show_comments = !self.show_comments;
    }

    /// Flip the viewer's like. Returns whether the post is now liked.
    pub async fn toggle_like<S: DocumentStore>(&mut self, store: &S, viewer: &UserId) -> Result<bool> {
        let value = Value::String(viewer.as_str().to_string());
        let field = "likes".to_string();

        let (liked, op) = if self.post.liker_ids.remove(viewer) {
            (false, FieldOp::ArrayRemove { field, value })
        } else {
            self.post.liker_ids.insert(viewer.clone());
            (true, FieldOp::ArrayUnion { field, value })
        };

        if let Err(e) = store.apply(POSTS_COLLECTION, self.post.id.as_str(), op).await {
            tracing::warn!(post = %self.post.id, error = %e, "failed to persist like");
            return Err(e.into());
        }
        tracing::debug!(post = %self.post.id, liked, "like toggled");
        Ok(liked)
    }

    /// Append a comment by `author`. Whitespace-only text is rejected before
    /// anything is written.
    pub async fn add_comment<S: DocumentStore>(
        &mut self,
        store: &S,
        author: &Session,
        text: &str,
    ) -> Result<&Comment> {
        let comment = Comment::new(author, text)?;
        let value = serde_json::to_value(&comment)?;
        self.post.comments.push(comment);

        let op = FieldOp::Append {
            field: "comments".into(),
            value,
        };
        if let Err(e) = store.apply(POSTS_COLLECTION, self.post.id.as_str(), op).await {
            tracing::warn!(post = %self.post.id, error = %e, "failed to persist comment");
            return Err(e.into());
        }

        let index = self.post.comments.len() - 1;
        Ok(&self.post.comments[index])
    }
}
