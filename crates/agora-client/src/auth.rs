//! Identity providers and the session they hold.
//!
//! A provider turns [`Credentials`] into a signed [`SessionToken`] and keeps
//! it in a [`SessionCell`]. The cell is shared with the remote store so every
//! request carries the current bearer token, and it broadcasts session
//! changes to whoever subscribed (the authentication gate, mostly).

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use agora_shared::constants::DEFAULT_SESSION_TTL_HOURS;
use agora_shared::session::{Credentials, SessionSigner, SessionToken, SignInResponse};
use agora_shared::{AuthError, Session};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tokio::sync::watch;

/// Contract of the external identity provider.
pub trait IdentityProvider: Send + Sync {
    fn current_session(&self) -> Option<Session>;

    /// Receiver notified whenever the session is installed or cleared.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;

    fn sign_in(
        &self,
        credentials: Credentials,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn sign_out(&self);
}

// ---------------------------------------------------------------------------
// SessionCell
// ---------------------------------------------------------------------------

struct CellInner {
    token: RwLock<Option<SessionToken>>,
    tx: watch::Sender<Option<Session>>,
    path: Option<PathBuf>,
}

/// Shared holder of the current session token.
#[derive(Clone)]
pub struct SessionCell {
    inner: Arc<CellInner>,
}

impl SessionCell {
    /// In-memory cell, nothing saved across runs.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Cell backed by a JSON file. A saved token that has already expired
    /// or no longer decodes is ignored.
    pub fn persistent(path: &Path) -> Self {
        let saved = load_token(path).filter(|t| !t.is_expired_at(Utc::now()));
        if let Some(token) = &saved {
            tracing::debug!(user = %token.session.id, "restored saved session");
        }
        Self::build(saved, Some(path.to_path_buf()))
    }

    fn build(token: Option<SessionToken>, path: Option<PathBuf>) -> Self {
        let (tx, _) = watch::channel(token.as_ref().map(|t| t.session.clone()));
        Self {
            inner: Arc::new(CellInner {
                token: RwLock::new(token),
                tx,
                path,
            }),
        }
    }

    pub fn install(&self, token: SessionToken) {
        let session = token.session.clone();
        if let Some(path) = &self.inner.path {
            save_token(path, &token);
        }
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.inner.tx.send_replace(Some(session));
    }

    pub fn clear(&self) {
        if let Some(path) = &self.inner.path {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, "failed to remove saved session");
                }
            }
        }
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.tx.send_replace(None);
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.tx.borrow().clone()
    }

    /// Encoded token for an `Authorization: Bearer` header.
    pub fn bearer(&self) -> Option<String> {
        let guard = self.inner.token.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().and_then(|t| t.encode().ok())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.tx.subscribe()
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

fn load_token(path: &Path) -> Option<SessionToken> {
    let json = std::fs::read(path).ok()?;
    match serde_json::from_slice(&json) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable saved session");
            None
        }
    }
}

fn save_token(path: &Path, token: &SessionToken) {
    let result = serde_json::to_vec_pretty(token)
        .map_err(std::io::Error::from)
        .and_then(|json| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json)
        });
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "failed to save session");
    }
}

// ---------------------------------------------------------------------------
// LocalIdentity
// ---------------------------------------------------------------------------

/// Identity provider that signs its own tokens. Used in offline mode and in
/// tests.
pub struct LocalIdentity {
    signer: SessionSigner,
    ttl: Duration,
    cell: SessionCell,
}

impl LocalIdentity {
    pub fn new(signer: SessionSigner, cell: SessionCell) -> Self {
        Self {
            signer,
            ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            cell,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signer.public_key_bytes()
    }

    pub fn cell(&self) -> &SessionCell {
        &self.cell
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_session(&self) -> Option<Session> {
        self.cell.session()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.cell.subscribe()
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError> {
        let session = credentials.into_session()?;
        let token = self.signer.issue(session.clone(), self.ttl)?;
        self.cell.install(token);
        tracing::info!(user = %session.id, "signed in locally");
        Ok(session)
    }

    fn sign_out(&self) {
        self.cell.clear();
    }
}

// ---------------------------------------------------------------------------
// RemoteIdentity
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Identity provider backed by the server's `/auth/sign-in` endpoint.
pub struct RemoteIdentity {
    http: reqwest::Client,
    base_url: String,
    cell: SessionCell,
}

impl RemoteIdentity {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, cell: SessionCell) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            cell,
        }
    }
}

impl IdentityProvider for RemoteIdentity {
    fn current_session(&self) -> Option<Session> {
        self.cell.session()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.cell.subscribe()
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError> {
        let url = format!("{}/auth/sign-in", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&credentials)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(AuthError::Rejected(message));
        }

        let granted: SignInResponse =
            serde_json::from_slice(&body).map_err(|_| AuthError::InvalidToken)?;
        let token = SessionToken::decode(&granted.token)?;
        if token.session != granted.session {
            return Err(AuthError::InvalidToken);
        }

        let session = token.session.clone();
        self.cell.install(token);
        tracing::info!(user = %session.id, server = %self.base_url, "signed in");
        Ok(session)
    }

    fn sign_out(&self) {
        self.cell.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str) -> Credentials {
        Credentials {
            email: email.into(),
            display_name: Some("Ada".into()),
            photo_ref: None,
        }
    }

    #[tokio::test]
    async fn sign_in_installs_and_notifies() {
        let identity = LocalIdentity::new(SessionSigner::generate(), SessionCell::new());
        let mut rx = identity.subscribe();
        assert!(identity.current_session().is_none());

        let session = identity.sign_in(credentials("ada@example.org")).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref(), Some(&session));
        assert_eq!(identity.current_session(), Some(session));

        let bearer = identity.cell().bearer().unwrap();
        let token = SessionToken::decode(&bearer).unwrap();
        assert!(token.verify(&identity.public_key_bytes()).is_ok());
    }

    #[tokio::test]
    async fn rejected_credentials_leave_no_session() {
        let identity = LocalIdentity::new(SessionSigner::generate(), SessionCell::new());
        let err = identity.sign_in(credentials("not-an-email")).await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
        assert!(identity.current_session().is_none());
        assert!(identity.cell().bearer().is_none());
    }

    #[tokio::test]
    async fn sign_out_clears() {
        let identity = LocalIdentity::new(SessionSigner::generate(), SessionCell::new());
        identity.sign_in(credentials("ada@example.org")).await.unwrap();
        identity.sign_out();
        assert!(identity.current_session().is_none());
        assert!(identity.cell().bearer().is_none());
    }

    #[tokio::test]
    async fn persistent_cell_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let signer = SessionSigner::generate();

        let identity = LocalIdentity::new(signer.clone(), SessionCell::persistent(&path));
        let session = identity.sign_in(credentials("ada@example.org")).await.unwrap();

        let restored = SessionCell::persistent(&path);
        assert_eq!(restored.session(), Some(session));

        restored.clear();
        assert!(!path.exists());
        assert!(SessionCell::persistent(&path).session().is_none());
    }

    #[tokio::test]
    async fn expired_saved_session_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let identity = LocalIdentity::new(SessionSigner::generate(), SessionCell::persistent(&path))
            .with_ttl(Duration::seconds(-1));
        identity.sign_in(credentials("ada@example.org")).await.unwrap();

        assert!(SessionCell::persistent(&path).session().is_none());
    }
}
