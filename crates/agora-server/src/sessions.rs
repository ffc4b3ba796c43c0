//! Session token verification and caching.
//!
//! Verifies bearer tokens signed by this server's session key and caches
//! successful verifications, keyed by the BLAKE3 hash of the encoded token,
//! so the signature is not re-checked on every request.

use std::collections::HashMap;
use std::sync::Arc;

use agora_shared::session::SessionToken;
use agora_shared::{AuthError, Session};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::api::AppState;
use crate::error::ServerError;

#[derive(Debug, Clone)]
struct CachedSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

impl CachedSession {
    fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// Verifies and caches session tokens.
#[derive(Clone)]
pub struct SessionVerifier {
    /// Public half of the server's session signing key.
    issuer_pubkey: [u8; 32],
    cache: Arc<RwLock<HashMap<[u8; 32], CachedSession>>>,
}

impl SessionVerifier {
    pub fn new(issuer_pubkey: [u8; 32]) -> Self {
        Self {
            issuer_pubkey,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Verify a bearer-encoded session token.
    pub async fn verify(&self, bearer: &str) -> Result<Session, AuthError> {
        let key = *blake3::hash(bearer.as_bytes()).as_bytes();

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&key) {
                if entry.is_fresh() {
                    debug!(user = %entry.session.id, "Session served from cache");
                    return Ok(entry.session.clone());
                }
            }
        }

        let token = SessionToken::decode(bearer)?;
        let session = token.verify(&self.issuer_pubkey)?.clone();

        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CachedSession {
                session: session.clone(),
                expires_at: token.expires_at,
            },
        );
        debug!(user = %session.id, until = %token.expires_at, "Session verified");

        Ok(session)
    }

    /// Evict expired entries from the cache.
    pub async fn purge_expired(&self) {
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|_, entry| entry.is_fresh());
        let removed = before - cache.len();
        if removed > 0 {
            debug!(removed, "Purged expired session cache entries");
        }
    }

    #[cfg(test)]
    async fn cached(&self) -> usize {
        self.cache.read().await.len()
    }
}

/// Reject requests without a valid `Authorization: Bearer` session token and
/// attach the verified [`Session`] as a request extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::NotSignedIn)?;

    let session = state.verifier.verify(bearer.trim()).await?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_shared::session::{Credentials, SessionSigner};
    use chrono::Duration;

    fn session() -> Session {
        Credentials {
            email: "ada@example.org".into(),
            display_name: None,
            photo_ref: None,
        }
        .into_session()
        .unwrap()
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let signer = SessionSigner::generate();
        let bearer = signer.issue(session(), Duration::hours(1)).unwrap().encode().unwrap();

        let verifier = SessionVerifier::new(signer.public_key_bytes());
        assert_eq!(verifier.verify(&bearer).await.unwrap(), session());
        assert_eq!(verifier.cached().await, 1);
        assert!(verifier.verify(&bearer).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_expired_token() {
        let signer = SessionSigner::generate();
        let bearer = signer
            .issue_at(session(), Utc::now() - Duration::hours(2), Duration::hours(1))
            .unwrap()
            .encode()
            .unwrap();

        let verifier = SessionVerifier::new(signer.public_key_bytes());
        assert_eq!(verifier.verify(&bearer).await, Err(AuthError::Expired));
        assert_eq!(verifier.cached().await, 0);
    }

    #[tokio::test]
    async fn test_verify_wrong_key() {
        let signer = SessionSigner::generate();
        let other = SessionSigner::generate();
        let bearer = signer.issue(session(), Duration::hours(1)).unwrap().encode().unwrap();

        let verifier = SessionVerifier::new(other.public_key_bytes());
        assert_eq!(verifier.verify(&bearer).await, Err(AuthError::BadSignature));
    }

    #[tokio::test]
    async fn test_verify_garbage() {
        let verifier = SessionVerifier::new(SessionSigner::generate().public_key_bytes());
        assert_eq!(verifier.verify("not-a-token").await, Err(AuthError::InvalidToken));
    }
}
