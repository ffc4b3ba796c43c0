//! Home feed: every post, newest first.

use agora_shared::constants::POSTS_COLLECTION;
use agora_shared::models::sort_newest_first;
use agora_shared::{AuthError, Post, PostId, Session};
use agora_store::DocumentStore;

use crate::error::{ClientError, Result};
use crate::refresh::RefreshSubscriber;
use crate::views::post_card::PostCard;

/// Fetch the whole post collection, newest first.
///
/// Documents that do not decode as posts are logged and skipped.
pub async fn fetch_posts<S: DocumentStore>(store: &S) -> agora_store::Result<Vec<Post>> {
    let documents = store.get_all(POSTS_COLLECTION).await?;

    let mut posts: Vec<Post> = documents
        .into_iter()
        .filter_map(|doc| match Post::from_document(&doc.id, doc.data) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::warn!(post = %doc.id, error = %e, "skipping malformed post");
                None
            }
        })
        .collect();

    sort_newest_first(&mut posts);
    Ok(posts)
}

#[derive(Debug, PartialEq)]
pub enum FeedState<'a> {
    Loading,
    Empty,
    Posts(&'a [PostCard]),
}

pub struct Feed<S> {
    store: S,
    viewer: Option<Session>,
    cards: Vec<PostCard>,
    loaded: bool,
    refreshing: bool,
}

impl<S: DocumentStore> Feed<S> {
    pub fn new(store: S, viewer: Option<Session>) -> Self {
        Self {
            store,
            viewer,
            cards: Vec::new(),
            loaded: false,
            refreshing: false,
        }
    }

    pub fn set_viewer(&mut self, viewer: Option<Session>) {
        self.viewer = viewer;
    }

    pub fn viewer(&self) -> Option<&Session> {
        self.viewer.as_ref()
    }

    /// Replace the list with a fresh fetch. A failed fetch is logged and
    /// leaves the feed empty.
    pub async fn load(&mut self) {
        self.cards = match fetch_posts(&self.store).await {
            Ok(posts) => posts.into_iter().map(PostCard::new).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load feed");
                Vec::new()
            }
        };
        self.loaded = true;
        tracing::debug!(posts = self.cards.len(), "feed loaded");
    }

    /// Manual refresh. `on_refreshed` runs after the list is replaced.
    pub async fn refresh<F: FnOnce()>(&mut self, on_refreshed: F) {
        self.refreshing = true;
        self.load().await;
        self.refreshing = false;
        on_refreshed();
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn state(&self) -> FeedState<'_> {
        if !self.loaded {
            FeedState::Loading
        } else if self.cards.is_empty() {
            FeedState::Empty
        } else {
            FeedState::Posts(&self.cards)
        }
    }

    pub fn cards(&self) -> &[PostCard] {
        &self.cards
    }

    pub fn card_mut(&mut self, id: &PostId) -> Option<&mut PostCard> {
        self.cards.iter_mut().find(|c| c.id() == id)
    }

    /// Toggle the viewer's like on one post.
    pub async fn toggle_like(&mut self, id: &PostId) -> Result<bool> {
        let viewer = self.viewer.as_ref().ok_or(AuthError::NotSignedIn)?;
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| ClientError::PostNotFound(id.to_string()))?;
        card.toggle_like(&self.store, &viewer.id).await
    }

    pub async fn add_comment(&mut self, id: &PostId, text: &str) -> Result<()> {
        let viewer = self.viewer.as_ref().ok_or(AuthError::NotSignedIn)?;
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| ClientError::PostNotFound(id.to_string()))?;
        card.add_comment(&self.store, viewer, text).await?;
        Ok(())
    }

    /// Refetch on every observed refresh until the signal is dropped.
    /// Returns the number of refetches performed.
    pub async fn follow(&mut self, mut subscriber: RefreshSubscriber) -> usize {
        let mut refetches = 0;
        while let Some(generation) = subscriber.changed().await {
            tracing::debug!(generation, "feed refresh requested");
            self.load().await;
            refetches += 1;
        }
        refetches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_store::LocalStore;
    use serde_json::json;

    use crate::refresh::RefreshSignal;
    use crate::testing::{session, FailingStore};

    async fn insert(store: &LocalStore, content: &str, created_at: serde_json::Value) -> String {
        let record = json!({
            "userId": "u1",
            "userEmail": "u1@example.org",
            "userName": "U1",
            "userPhotoURL": "",
            "content": content,
            "likes": [],
            "comments": [],
            "createdAt": created_at,
        });
        store.create(POSTS_COLLECTION, record).await.unwrap()
    }

    fn contents(feed: &Feed<LocalStore>) -> Vec<String> {
        feed.cards()
            .iter()
            .map(|c| c.post().text_content.clone())
            .collect()
    }

    #[tokio::test]
    async fn newest_first_with_stable_ties_and_mixed_shapes() {
        let store = LocalStore::in_memory().unwrap();
        insert(&store, "old", json!("2024-01-01T00:00:00Z")).await;
        insert(&store, "tie-a", json!({ "seconds": 1_709_294_400, "nanoseconds": 0 })).await;
        insert(&store, "newest", json!(1_717_200_000_000_i64)).await;
        insert(&store, "tie-b", json!("2024-03-01T12:00:00.000Z")).await;
        insert(&store, "broken-date", json!("yesterday-ish")).await;

        let mut feed = Feed::new(store, None);
        assert_eq!(feed.state(), FeedState::Loading);
        feed.load().await;

        assert_eq!(contents(&feed), ["newest", "tie-a", "tie-b", "old", "broken-date"]);
    }

    #[tokio::test]
    async fn unexpected_timestamp_shapes_keep_the_post() {
        let store = LocalStore::in_memory().unwrap();
        insert(&store, "good", json!("2024-01-01T00:00:00Z")).await;
        insert(&store, "float", json!(1.7e12)).await;
        insert(&store, "object", json!({})).await;
        insert(&store, "bool", json!(true)).await;

        let posts = fetch_posts(&store).await.unwrap();
        let contents: Vec<_> = posts.iter().map(|p| p.text_content.as_str()).collect();
        assert_eq!(contents, ["good", "float", "object", "bool"]);
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped() {
        let store = LocalStore::in_memory().unwrap();
        insert(&store, "fine", json!("2024-01-01T00:00:00Z")).await;
        store
            .create(POSTS_COLLECTION, json!({ "content": 42 }))
            .await
            .unwrap();

        let mut feed = Feed::new(store, None);
        feed.load().await;
        assert_eq!(contents(&feed), ["fine"]);
    }

    #[tokio::test]
    async fn empty_and_failed_fetches_show_empty_state() {
        let mut feed = Feed::new(LocalStore::in_memory().unwrap(), None);
        feed.load().await;
        assert_eq!(feed.state(), FeedState::Empty);

        let mut failing = Feed::new(FailingStore, None);
        failing.load().await;
        assert_eq!(failing.state(), FeedState::Empty);
    }

    #[tokio::test]
    async fn refresh_runs_callback_after_reload() {
        let store = LocalStore::in_memory().unwrap();
        let mut feed = Feed::new(store.clone(), None);
        feed.load().await;

        insert(&store, "later", json!("2024-01-01T00:00:00Z")).await;
        let mut called = false;
        feed.refresh(|| called = true).await;

        assert!(called);
        assert!(!feed.is_refreshing());
        assert_eq!(feed.cards().len(), 1);
    }

    #[tokio::test]
    async fn interactions_need_a_viewer() {
        let store = LocalStore::in_memory().unwrap();
        let id = PostId::from(insert(&store, "p", json!("2024-01-01T00:00:00Z")).await.as_str());

        let mut anonymous = Feed::new(store.clone(), None);
        anonymous.load().await;
        assert!(matches!(
            anonymous.toggle_like(&id).await,
            Err(ClientError::Auth(AuthError::NotSignedIn))
        ));

        let mut feed = Feed::new(store, Some(session("ada@example.org")));
        feed.load().await;
        assert!(feed.toggle_like(&id).await.unwrap());
        feed.add_comment(&id, "hello").await.unwrap();
        assert_eq!(feed.card_mut(&id).unwrap().comment_count(), 1);
        assert!(matches!(
            feed.toggle_like(&PostId::from("missing")).await,
            Err(ClientError::PostNotFound(_))
        ));
    }

    #[tokio::test]
    async fn two_quick_triggers_end_in_a_current_refetch() {
        let store = LocalStore::in_memory().unwrap();
        let signal = RefreshSignal::new();
        let subscriber = signal.subscribe();

        let mut feed = Feed::new(store.clone(), None);
        feed.load().await;
        let task = tokio::spawn(async move {
            let refetches = feed.follow(subscriber).await;
            (feed, refetches)
        });

        insert(&store, "first", json!("2024-01-01T00:00:00Z")).await;
        signal.trigger();
        insert(&store, "second", json!("2024-01-02T00:00:00Z")).await;
        signal.trigger();
        drop(signal);

        let (feed, refetches) = task.await.unwrap();
        assert!(refetches >= 1);
        assert_eq!(contents(&feed), ["second", "first"]);
    }
}
