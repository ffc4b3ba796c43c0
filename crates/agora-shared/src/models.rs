//! Document model for posts, comments, profiles and sessions.
//!
//! Field names on the wire follow the stored document layout (`userId`,
//! `content`, `likes`, `imageURL`, ...). Missing or `null` optional fields
//! deserialize to their defaults so records written by older clients still
//! load.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_DISPLAY_NAME;
use crate::error::ValidationError;
use crate::timestamp::StoreTimestamp;
use crate::types::{CommentId, PostId, UserId};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The signed-in viewer, as issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl Session {
    pub fn display_name_or_default(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => DEFAULT_DISPLAY_NAME,
        }
    }

    pub fn photo_ref_or_empty(&self) -> &str {
        self.photo_ref.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment on a post. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    #[serde(default)]
    pub id: CommentId,
    #[serde(rename = "userId")]
    pub author_id: UserId,
    #[serde(rename = "userEmail", default, deserialize_with = "null_as_empty")]
    pub author_email: String,
    #[serde(
        rename = "userName",
        default = "default_display_name",
        deserialize_with = "null_as_anonymous"
    )]
    pub author_display_name: String,
    #[serde(
        rename = "userPhotoURL",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub author_photo_ref: Option<String>,
    #[serde(rename = "content")]
    pub text_content: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: StoreTimestamp,
}

impl Comment {
    /// Build a new comment from raw input. The text is trimmed and must not
    /// be empty afterwards.
    pub fn new(author: &Session, text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyComment);
        }
        Ok(Self {
            id: CommentId::new(),
            author_id: author.id.clone(),
            author_email: author.email.clone(),
            author_display_name: author.display_name_or_default().to_string(),
            author_photo_ref: author.photo_ref.clone().filter(|p| !p.is_empty()),
            text_content: text.to_string(),
            created_at: StoreTimestamp::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A feed post. The id is the store's document id and is not part of the
/// stored record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(skip)]
    pub id: PostId,
    #[serde(rename = "userId")]
    pub author_id: UserId,
    #[serde(rename = "userEmail", default, deserialize_with = "null_as_empty")]
    pub author_email: String,
    #[serde(
        rename = "userName",
        default = "default_display_name",
        deserialize_with = "null_as_anonymous"
    )]
    pub author_display_name: String,
    #[serde(rename = "userPhotoURL", default, deserialize_with = "null_as_empty")]
    pub author_photo_ref: String,
    #[serde(rename = "content", default, deserialize_with = "null_as_empty")]
    pub text_content: String,
    #[serde(
        rename = "imageURL",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub image_ref: Option<String>,
    #[serde(rename = "likes", default, deserialize_with = "null_as_default")]
    pub liker_ids: BTreeSet<UserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
    #[serde(rename = "createdAt", default)]
    pub created_at: StoreTimestamp,
}

impl Post {
    /// Fresh post by `author` with no likes or comments, stamped now.
    pub fn new(author: &Session, text: &str, image_ref: Option<String>) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok(Self {
            id: PostId::default(),
            author_id: author.id.clone(),
            author_email: author.email.clone(),
            author_display_name: author.display_name_or_default().to_string(),
            author_photo_ref: author.photo_ref_or_empty().to_string(),
            text_content: text.to_string(),
            image_ref,
            liker_ids: BTreeSet::new(),
            comments: Vec::new(),
            created_at: StoreTimestamp::now(),
        })
    }

    /// Decode a stored document, attaching its id.
    pub fn from_document(id: &str, data: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut post: Post = serde_json::from_value(data)?;
        post.id = PostId(id.to_string());
        Ok(post)
    }

    /// The stored record (everything but the id).
    pub fn to_record(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.liker_ids.contains(user)
    }

    pub fn like_count(&self) -> usize {
        self.liker_ids.len()
    }
}

/// Order posts newest first. The sort is stable, so posts with equal
/// timestamps keep the order the store returned them in.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|p| std::cmp::Reverse(p.created_at.instant()));
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Editable per-user profile, stored under the user's id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: UserId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bio: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub website: String,
    #[serde(rename = "photoURL", default, deserialize_with = "null_as_empty")]
    pub photo_ref: String,
}

impl Profile {
    /// Profile shown before the user has ever saved one.
    pub fn defaults_for(session: &Session) -> Self {
        Self {
            user_id: session.id.clone(),
            display_name: session.display_name.clone().unwrap_or_default(),
            bio: String::new(),
            location: String::new(),
            website: String::new(),
            photo_ref: session.photo_ref.clone().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// serde helpers
// ---------------------------------------------------------------------------

fn default_display_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn null_as_anonymous<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default_display_name))
}

fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.filter(|s| !s.is_empty()))
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session {
            id: UserId::from_email("ada@example.org"),
            email: "ada@example.org".into(),
            display_name: Some("Ada".into()),
            photo_ref: None,
        }
    }

    fn post_at(id: &str, created_at: serde_json::Value) -> Post {
        Post::from_document(
            id,
            json!({ "userId": "u1", "content": id, "createdAt": created_at }),
        )
        .unwrap()
    }

    #[test]
    fn decodes_sparse_legacy_document() {
        let post = Post::from_document(
            "p1",
            json!({
                "userId": "u1",
                "userEmail": null,
                "userName": "",
                "content": "hello",
                "imageURL": "",
                "likes": ["u2", "u2", "u3"],
                "createdAt": { "seconds": 10, "nanoseconds": 0 }
            }),
        )
        .unwrap();

        assert_eq!(post.id, PostId::from("p1"));
        assert_eq!(post.author_email, "");
        assert_eq!(post.author_display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(post.image_ref, None);
        assert_eq!(post.like_count(), 2);
        assert!(post.comments.is_empty());
    }

    #[test]
    fn legacy_comment_ids_are_stable() {
        let record = json!({
            "userId": "u1",
            "content": "post",
            "comments": [{ "userId": "u2", "content": "no id here" }]
        });
        let first = Post::from_document("p1", record.clone()).unwrap();
        let second = Post::from_document("p1", record).unwrap();

        assert_eq!(first.comments[0].id, CommentId::default());
        assert_eq!(first.comments[0].id, second.comments[0].id);
    }

    #[test]
    fn record_uses_stored_field_names_and_omits_id() {
        let post = Post::new(&session(), "  hi there ", None).unwrap();
        let record = post.to_record().unwrap();

        assert_eq!(record["content"], "hi there");
        assert_eq!(record["userName"], "Ada");
        assert_eq!(record["likes"], json!([]));
        assert!(record.get("id").is_none());
        assert!(record.get("imageURL").is_none());
    }

    #[test]
    fn whitespace_only_post_is_rejected() {
        assert_eq!(
            Post::new(&session(), " \n\t ", None),
            Err(ValidationError::EmptyText)
        );
    }

    #[test]
    fn comment_text_is_trimmed_verbatim() {
        let comment = Comment::new(&session(), "  nice  post ").unwrap();
        assert_eq!(comment.text_content, "nice  post");
        assert_eq!(comment.author_display_name, "Ada");
        assert_eq!(Comment::new(&session(), "   "), Err(ValidationError::EmptyComment));
    }

    #[test]
    fn newest_first_with_stable_ties() {
        let mut posts = vec![
            post_at("old", json!("2024-01-01T00:00:00Z")),
            post_at("tie-a", json!("2024-06-01T00:00:00Z")),
            post_at("new", json!(1735689600000_i64)),
            post_at("tie-b", json!({ "seconds": 1717200000, "nanoseconds": 0 })),
            post_at("broken", json!("not a date")),
        ];
        sort_newest_first(&mut posts);

        let order: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, ["new", "tie-a", "tie-b", "old", "broken"]);

        for pair in posts.windows(2) {
            assert!(pair[0].created_at.instant() >= pair[1].created_at.instant());
        }
    }

    #[test]
    fn profile_defaults_come_from_session() {
        let profile = Profile::defaults_for(&session());
        assert_eq!(profile.display_name, "Ada");
        assert_eq!(profile.bio, "");
        assert_eq!(profile.photo_ref, "");
    }

    #[test]
    fn session_display_name_falls_back() {
        let mut s = session();
        s.display_name = Some("   ".into());
        assert_eq!(s.display_name_or_default(), DEFAULT_DISPLAY_NAME);
    }
}
