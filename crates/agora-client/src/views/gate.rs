//! Authentication gate in front of every signed-in view.

use agora_shared::session::Credentials;
use agora_shared::{AuthError, Session};
use tokio::sync::watch;

use crate::auth::IdentityProvider;

pub struct AuthGate<P> {
    provider: P,
    rx: watch::Receiver<Option<Session>>,
}

impl<P: IdentityProvider> AuthGate<P> {
    pub fn new(provider: P) -> Self {
        let rx = provider.subscribe();
        Self { provider, rx }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn session(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The signed-in session, or `NotSignedIn`.
    pub fn require(&self) -> Result<Session, AuthError> {
        self.session().ok_or(AuthError::NotSignedIn)
    }

    pub async fn sign_in(&self, credentials: Credentials) -> Result<Session, AuthError> {
        self.provider.sign_in(credentials).await.map_err(|e| {
            tracing::warn!(error = %e, "sign-in failed");
            e
        })
    }

    pub fn sign_out(&self) {
        self.provider.sign_out();
        tracing::info!("signed out");
    }

    /// Wait for the next session change. `None` once the provider is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
