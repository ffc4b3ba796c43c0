//! Stories strip: one bubble per author who has posted.

use std::collections::HashSet;

use agora_shared::constants::{AUTHORS_COLLECTION, AVATAR_FALLBACK_URL, POSTS_COLLECTION, UNKNOWN_AUTHOR};
use agora_shared::{Post, Session, UserId};
use agora_store::DocumentStore;
use serde::{Deserialize, Serialize};

/// Entry of the `authors` index, written alongside every post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorEntry {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "userName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "userEmail", default)]
    pub email: Option<String>,
    #[serde(rename = "userPhotoURL", default)]
    pub photo_ref: Option<String>,
}

impl AuthorEntry {
    pub fn from_session(session: &Session) -> Self {
        Self {
            user_id: session.id.clone(),
            display_name: session.display_name.clone(),
            email: Some(session.email.clone()),
            photo_ref: session.photo_ref.clone(),
        }
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            user_id: post.author_id.clone(),
            display_name: Some(post.author_display_name.clone()),
            email: Some(post.author_email.clone()),
            photo_ref: Some(post.author_photo_ref.clone()),
        }
    }

    pub fn to_record(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Display name, else email, else "Unknown".
    pub fn label(&self) -> &str {
        [&self.display_name, &self.email]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Photo, else a generated avatar for the label.
    pub fn avatar_url(&self) -> String {
        if let Some(photo) = self.photo_ref.as_deref().filter(|p| !p.trim().is_empty()) {
            return photo.to_string();
        }
        match reqwest::Url::parse_with_params(AVATAR_FALLBACK_URL, &[("name", self.label())]) {
            Ok(url) => url.to_string(),
            Err(_) => AVATAR_FALLBACK_URL.to_string(),
        }
    }
}

/// Unique authors in first-seen order.
///
/// Entries of the `authors` index come first. Authors of posts written before
/// the index existed follow, so nobody who has posted is missing. A failed
/// read of either collection is logged and contributes nothing.
pub async fn load_stories<S: DocumentStore>(store: &S) -> Vec<AuthorEntry> {
    let (index, posts) = futures::join!(
        store.get_all(AUTHORS_COLLECTION),
        store.get_all(POSTS_COLLECTION)
    );

    let indexed: Vec<AuthorEntry> = match index {
        Ok(docs) => docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<AuthorEntry>(doc.data) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(author = %doc.id, error = %e, "skipping malformed author entry");
                    None
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load author index");
            Vec::new()
        }
    };

    let derived: Vec<AuthorEntry> = match posts {
        Ok(docs) => docs
            .into_iter()
            .filter_map(|doc| match Post::from_document(&doc.id, doc.data) {
                Ok(post) => Some(AuthorEntry::from_post(&post)),
                Err(e) => {
                    tracing::warn!(post = %doc.id, error = %e, "skipping malformed post");
                    None
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to derive stories from posts");
            Vec::new()
        }
    };

    dedup(indexed.into_iter().chain(derived))
}

fn dedup(entries: impl Iterator<Item = AuthorEntry>) -> Vec<AuthorEntry> {
    let mut seen = HashSet::new();
    entries
        .filter(|e| !e.user_id.as_str().is_empty() && seen.insert(e.user_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_store::LocalStore;

    use crate::testing::{session, FailingStore};
    use crate::views::composer::Composer;

    #[tokio::test]
    async fn composer_maintains_the_index() {
        let store = LocalStore::in_memory().unwrap();
        let ada = session("ada@example.org");
        let bob = session("bob@example.org");

        let mut composer = Composer::new(store.clone());
        for (who, text) in [(&ada, "one"), (&bob, "two"), (&ada, "three")] {
            composer.set_text(text);
            composer.submit(Some(who)).await.unwrap();
        }

        let stories = load_stories(&store).await;
        let ids: Vec<_> = stories.iter().map(|s| s.user_id.clone()).collect();
        assert_eq!(ids, [ada.id, bob.id]);
    }

    #[tokio::test]
    async fn falls_back_to_posts_without_an_index() {
        let store = LocalStore::in_memory().unwrap();
        let ada = session("ada@example.org");
        for text in ["a", "b"] {
            let post = Post::new(&ada, text, None).unwrap();
            store.create(POSTS_COLLECTION, post.to_record().unwrap()).await.unwrap();
        }

        let stories = load_stories(&store).await;
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].label(), "ada");
    }

    #[tokio::test]
    async fn legacy_authors_survive_the_first_indexed_post() {
        let store = LocalStore::in_memory().unwrap();
        let legacy = session("legacy@example.org");
        let newcomer = session("new@example.org");

        let old = Post::new(&legacy, "from before the index", None).unwrap();
        store.create(POSTS_COLLECTION, old.to_record().unwrap()).await.unwrap();
        assert_eq!(load_stories(&store).await.len(), 1);

        let mut composer = Composer::new(store.clone());
        composer.set_text("first indexed post");
        composer.submit(Some(&newcomer)).await.unwrap();

        let labels: Vec<_> = load_stories(&store)
            .await
            .iter()
            .map(|s| s.label().to_string())
            .collect();
        assert_eq!(labels, ["new", "legacy"]);
    }

    #[tokio::test]
    async fn index_entry_wins_over_post_fields() {
        let store = LocalStore::in_memory().unwrap();
        let ada = session("ada@example.org");

        let old = Post::new(&ada, "old name", None).unwrap();
        store.create(POSTS_COLLECTION, old.to_record().unwrap()).await.unwrap();

        let mut entry = AuthorEntry::from_session(&ada);
        entry.display_name = Some("Ada Lovelace".into());
        store
            .set(AUTHORS_COLLECTION, ada.id.as_str(), entry.to_record().unwrap())
            .await
            .unwrap();

        let stories = load_stories(&store).await;
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].label(), "Ada Lovelace");
    }

    #[tokio::test]
    async fn failure_gives_an_empty_strip() {
        assert!(load_stories(&FailingStore).await.is_empty());
    }

    #[test]
    fn label_and_avatar_fallbacks() {
        let mut entry = AuthorEntry {
            user_id: UserId::from("u1"),
            display_name: None,
            email: Some("ada@example.org".into()),
            photo_ref: None,
        };
        assert_eq!(entry.label(), "ada@example.org");

        entry.email = Some(String::new());
        assert_eq!(entry.label(), UNKNOWN_AUTHOR);
        assert_eq!(entry.avatar_url(), "https://ui-avatars.com/api/?name=Unknown");

        entry.display_name = Some("Ada Lovelace".into());
        assert_eq!(entry.avatar_url(), "https://ui-avatars.com/api/?name=Ada+Lovelace");

        entry.photo_ref = Some("https://img.example.org/ada.png".into());
        assert_eq!(entry.avatar_url(), "https://img.example.org/ada.png");
    }
}
