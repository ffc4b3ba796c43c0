//! Plain-text rendering of views for the terminal.

use std::fmt::Write;

use agora_shared::timestamp::format_relative;
use agora_shared::{Comment, Profile, UserId};
use chrono::{DateTime, Utc};

use crate::views::sidebar::FRIEND_SUGGESTIONS;
use crate::views::{AuthorEntry, FeedState, PostCard};

pub fn render_feed(state: FeedState<'_>, viewer: Option<&UserId>, now: DateTime<Utc>) -> String {
    match state {
        FeedState::Loading => "Loading posts...\n".to_string(),
        FeedState::Empty => "No posts yet\n".to_string(),
        FeedState::Posts(cards) => cards
            .iter()
            .map(|card| render_card(card, viewer, now))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn render_card(card: &PostCard, viewer: Option<&UserId>, now: DateTime<Utc>) -> String {
    let post = card.post();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "[{}] {} · {}",
        post.id,
        post.author_display_name,
        format_relative(post.created_at.instant(), now)
    );
    let _ = writeln!(out, "  {}", post.text_content);
    if let Some(image) = &post.image_ref {
        let _ = writeln!(out, "  [image, {} chars inline]", image.len());
    }

    let heart = match viewer {
        Some(id) if card.is_liked(id) => "♥",
        _ => "♡",
    };
    let _ = writeln!(out, "  {heart} {}  💬 {}", card.like_count(), card.comment_count());

    if card.show_comments() {
        for comment in card.comments() {
            out.push_str(&render_comment(comment, now));
        }
    }
    out
}

fn render_comment(comment: &Comment, now: DateTime<Utc>) -> String {
    format!(
        "    {} ({}): {}\n",
        comment.author_display_name,
        format_relative(comment.created_at.instant(), now),
        comment.text_content
    )
}

pub fn render_profile(profile: &Profile, email: &str, post_count: usize) -> String {
    let mut out = String::new();
    let name = if profile.display_name.is_empty() {
        agora_shared::constants::DEFAULT_DISPLAY_NAME
    } else {
        profile.display_name.as_str()
    };
    let _ = writeln!(out, "{name} <{email}>");
    for (label, value) in [
        ("Bio", &profile.bio),
        ("Location", &profile.location),
        ("Website", &profile.website),
        ("Photo", &profile.photo_ref),
    ] {
        if !value.is_empty() {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
    let _ = writeln!(out, "  Posts: {post_count}");
    out
}

pub fn render_stories(entries: &[AuthorEntry]) -> String {
    if entries.is_empty() {
        return "No stories yet\n".to_string();
    }
    entries
        .iter()
        .map(|e| format!("{}  {}\n", e.label(), e.avatar_url()))
        .collect()
}

pub fn render_suggestions() -> String {
    FRIEND_SUGGESTIONS
        .iter()
        .map(|f| format!("{} {}  {}\n", f.name, f.handle, f.avatar_url))
        .collect()
}
