use std::path::Path;

use agora_shared::PostId;
use chrono::Utc;

use crate::error::Result;
use crate::output::{render_card, render_feed};
use crate::state::AppState;
use crate::views::{Composer, Feed};

async fn loaded_feed(state: &AppState) -> Feed<crate::state::AnyStore> {
    let mut feed = Feed::new(state.store.clone(), state.session());
    feed.load().await;
    feed
}

pub async fn feed(state: &AppState, show_comments: bool) -> String {
    let mut feed = loaded_feed(state).await;
    if show_comments {
        let ids: Vec<PostId> = feed.cards().iter().map(|c| c.id().clone()).collect();
        for id in &ids {
            if let Some(card) = feed.card_mut(id) {
                card.toggle_comments();
            }
        }
    }
    let viewer = feed.viewer().map(|s| s.id.clone());
    render_feed(feed.state(), viewer.as_ref(), Utc::now())
}

/// Publish a post, then refetch the feed once the refresh signal fires.
pub async fn post(state: &AppState, text: &str, image: Option<&Path>) -> Result<String> {
    let session = state.gate.require()?;
    let mut subscriber = state.refresh.subscribe();

    let mut composer = Composer::new(state.store.clone()).with_refresh(state.refresh.clone());
    if let Some(path) = image {
        let attached = composer.attach_image_file(path).await?;
        tracing::debug!(mime = attached.mime(), size = %attached.size_label(), "image attached");
    }
    composer.set_text(text);
    let id = composer.submit(Some(&session)).await?;

    let mut feed = Feed::new(state.store.clone(), Some(session.clone()));
    if subscriber.changed().await.is_some() {
        feed.load().await;
    }
    let rendered = feed
        .card_mut(&id)
        .map(|card| render_card(card, Some(&session.id), Utc::now()))
        .unwrap_or_default();
    Ok(format!("Posted {id}\n{rendered}"))
}

pub async fn like(state: &AppState, id: &str) -> Result<String> {
    state.gate.require()?;
    let mut feed = loaded_feed(state).await;
    let id = PostId::from(id);
    let liked = feed.toggle_like(&id).await?;
    Ok(if liked {
        format!("Liked {id}\n")
    } else {
        format!("Unliked {id}\n")
    })
}

pub async fn comment(state: &AppState, id: &str, text: &str) -> Result<String> {
    state.gate.require()?;
    let mut feed = loaded_feed(state).await;
    let id = PostId::from(id);
    feed.add_comment(&id, text).await?;
    Ok(format!("Commented on {id}\n"))
}
