//! The viewer's own profile page: profile card plus their posts.

use agora_shared::constants::PROFILES_COLLECTION;
use agora_shared::{Post, Profile, Session};
use agora_store::DocumentStore;

use crate::error::Result;
use crate::views::feed::fetch_posts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    DisplayName,
    Bio,
    Location,
    Website,
    Photo,
}

pub struct ProfilePage<S> {
    store: S,
    session: Session,
    saved: Profile,
    draft: Option<Profile>,
    posts: Vec<Post>,
}

impl<S: DocumentStore> ProfilePage<S> {
    pub fn new(store: S, session: Session) -> Self {
        let saved = Profile::defaults_for(&session);
        Self {
            store,
            session,
            saved,
            draft: None,
            posts: Vec::new(),
        }
    }

    /// Fetch posts and profiles concurrently. Either failure is logged and
    /// that half falls back to empty/defaults.
    pub async fn load(&mut self) {
        let (posts, profiles) = futures::join!(
            fetch_posts(&self.store),
            self.store.get_all(PROFILES_COLLECTION)
        );

        self.posts = match posts {
            Ok(posts) => posts
                .into_iter()
                .filter(|p| p.author_id == self.session.id)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load profile posts");
                Vec::new()
            }
        };

        let found = match profiles {
            Ok(docs) => docs
                .into_iter()
                .filter_map(|doc| match serde_json::from_value::<Profile>(doc.data) {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        tracing::warn!(profile = %doc.id, error = %e, "skipping malformed profile");
                        None
                    }
                })
                .find(|p| p.user_id == self.session.id),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load profiles");
                None
            }
        };
        self.saved = found.unwrap_or_else(|| Profile::defaults_for(&self.session));
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The profile as currently shown: the staged draft while editing.
    pub fn profile(&self) -> &Profile {
        self.draft.as_ref().unwrap_or(&self.saved)
    }

    pub fn saved(&self) -> &Profile {
        &self.saved
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn begin_edit(&mut self) {
        if self.draft.is_none() {
            self.draft = Some(self.saved.clone());
        }
    }

    /// Stage a field change, entering edit mode if needed.
    pub fn set_field(&mut self, field: ProfileField, value: impl Into<String>) {
        let draft = self.draft.get_or_insert_with(|| self.saved.clone());
        let slot = match field {
            ProfileField::DisplayName => &mut draft.display_name,
            ProfileField::Bio => &mut draft.bio,
            ProfileField::Location => &mut draft.location,
            ProfileField::Website => &mut draft.website,
            ProfileField::Photo => &mut draft.photo_ref,
        };
        *slot = value.into();
    }

    /// Discard staged edits and show the last saved profile again.
    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Write the staged profile as a whole record keyed by user id. On
    /// failure the page stays in edit mode with the draft intact.
    pub async fn save(&mut self) -> Result<()> {
        let Some(draft) = self.draft.as_ref() else {
            return Ok(());
        };

        let record = serde_json::to_value(draft)?;
        if let Err(e) = self
            .store
            .set(PROFILES_COLLECTION, self.session.id.as_str(), record)
            .await
        {
            tracing::warn!(user = %self.session.id, error = %e, "failed to save profile");
            return Err(e.into());
        }

        if let Some(draft) = self.draft.take() {
            self.saved = draft;
        }
        tracing::info!(user = %self.session.id, "profile saved");
        Ok(())
    }
}
