//! Application state shared by every command.
//!
//! [`AppState`] owns the store handle, the authentication gate and the
//! refresh signal for the lifetime of one client run. The store and the
//! identity provider are either local (offline mode, SQLite in the data
//! directory) or remote (the Agora HTTP API).

use agora_shared::session::{Credentials, SessionSigner};
use agora_shared::{AuthError, Session};
use agora_store::{Document, DocumentStore, FieldOp, LocalStore, Result as StoreResult, WriteBatch};
use serde_json::Value;
use tokio::sync::watch;

use crate::auth::{IdentityProvider, LocalIdentity, RemoteIdentity, SessionCell};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::refresh::RefreshSignal;
use crate::remote::RemoteStore;
use crate::views::gate::AuthGate;

/// Either store backend behind one concrete type.
#[derive(Clone)]
pub enum AnyStore {
    Local(LocalStore),
    Remote(RemoteStore),
}

impl DocumentStore for AnyStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        match self {
            Self::Local(s) => s.get_all(collection).await,
            Self::Remote(s) => s.get_all(collection).await,
        }
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        match self {
            Self::Local(s) => s.get(collection, id).await,
            Self::Remote(s) => s.get(collection, id).await,
        }
    }

    async fn create(&self, collection: &str, data: Value) -> StoreResult<String> {
        match self {
            Self::Local(s) => s.create(collection, data).await,
            Self::Remote(s) => s.create(collection, data).await,
        }
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> StoreResult<()> {
        match self {
            Self::Local(s) => s.update(collection, id, fields).await,
            Self::Remote(s) => s.update(collection, id, fields).await,
        }
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        match self {
            Self::Local(s) => s.set(collection, id, data).await,
            Self::Remote(s) => s.set(collection, id, data).await,
        }
    }

    async fn apply(&self, collection: &str, id: &str, op: FieldOp) -> StoreResult<()> {
        match self {
            Self::Local(s) => s.apply(collection, id, op).await,
            Self::Remote(s) => s.apply(collection, id, op).await,
        }
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<Vec<String>> {
        match self {
            Self::Local(s) => s.commit(batch).await,
            Self::Remote(s) => s.commit(batch).await,
        }
    }
}

/// Either identity provider behind one concrete type.
pub enum AnyIdentity {
    Local(LocalIdentity),
    Remote(RemoteIdentity),
}

impl IdentityProvider for AnyIdentity {
    fn current_session(&self) -> Option<Session> {
        match self {
            Self::Local(p) => p.current_session(),
            Self::Remote(p) => p.current_session(),
        }
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        match self {
            Self::Local(p) => p.subscribe(),
            Self::Remote(p) => p.subscribe(),
        }
    }

    async fn sign_in(&self, credentials: Credentials) -> std::result::Result<Session, AuthError> {
        match self {
            Self::Local(p) => p.sign_in(credentials).await,
            Self::Remote(p) => p.sign_in(credentials).await,
        }
    }

    fn sign_out(&self) {
        match self {
            Self::Local(p) => p.sign_out(),
            Self::Remote(p) => p.sign_out(),
        }
    }
}

/// Central application state.
pub struct AppState {
    pub config: ClientConfig,
    pub store: AnyStore,
    pub gate: AuthGate<AnyIdentity>,
    pub refresh: RefreshSignal,
    pub offline: bool,
}

impl AppState {
    /// Wire up the store and identity provider for `config`.
    ///
    /// Offline mode opens `agora.db` in the data directory and signs
    /// sessions locally. Otherwise both talk to `config.server_url`.
    pub fn open(config: ClientConfig, offline: bool) -> Result<Self> {
        let cell = SessionCell::persistent(&config.session_path());

        let (store, identity) = if offline {
            let store = LocalStore::open_at(&config.database_path())?;
            let identity = LocalIdentity::new(SessionSigner::generate(), cell);
            (AnyStore::Local(store), AnyIdentity::Local(identity))
        } else {
            let http = reqwest::Client::new();
            let store = RemoteStore::new(http.clone(), config.server_url.clone(), cell.clone());
            let identity = RemoteIdentity::new(http, config.server_url.clone(), cell);
            (AnyStore::Remote(store), AnyIdentity::Remote(identity))
        };

        tracing::debug!(
            offline,
            server = %config.server_url,
            data_dir = %config.data_dir.display(),
            "application state ready"
        );

        Ok(Self {
            config,
            store,
            gate: AuthGate::new(identity),
            refresh: RefreshSignal::new(),
            offline,
        })
    }

    /// In-memory offline state, for tests.
    pub fn in_memory(config: ClientConfig) -> Result<Self> {
        let identity = LocalIdentity::new(SessionSigner::generate(), SessionCell::new());
        Ok(Self {
            config,
            store: AnyStore::Local(LocalStore::in_memory()?),
            gate: AuthGate::new(AnyIdentity::Local(identity)),
            refresh: RefreshSignal::new(),
            offline: true,
        })
    }

    pub fn session(&self) -> Option<Session> {
        self.gate.session()
    }
}
