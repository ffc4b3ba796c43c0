//! [`DocumentStore`] over the Agora HTTP API.

use agora_store::{Document, DocumentStore, FieldOp, Result, StoreError, WriteBatch};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::SessionCell;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct Committed {
    ids: Vec<String>,
}

/// Remote document store. Requests carry the bearer token of the shared
/// [`SessionCell`] when one is installed.
#[derive(Clone)]
pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
    session: SessionCell,
}

impl RemoteStore {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, session: SessionCell) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, format!("{}/v1/{path}", self.base_url));
        if let Some(bearer) = self.session.bearer() {
            req = req.bearer_auth(bearer);
        }
        req
    }

    async fn send(req: RequestBuilder) -> Result<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(remote_error(resp).await)
        }
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let body = resp
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn remote_error(resp: Response) -> StoreError {
    let status = resp.status();
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string(),
    };
    tracing::debug!(status = status.as_u16(), %message, "store request failed");
    StoreError::Remote {
        status: status.as_u16(),
        message,
    }
}

impl DocumentStore for RemoteStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>> {
        let resp = Self::send(self.request(Method::GET, collection)).await?;
        Self::json(resp).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let resp = self
            .request(Method::GET, &format!("{collection}/{id}"))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(Self::json(resp).await?)),
            _ => Err(remote_error(resp).await),
        }
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String> {
        let resp = Self::send(self.request(Method::POST, collection).json(&data)).await?;
        let created: Created = Self::json(resp).await?;
        Ok(created.id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        Self::send(
            self.request(Method::PATCH, &format!("{collection}/{id}"))
                .json(&fields),
        )
        .await?;
        Ok(())
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        Self::send(
            self.request(Method::PUT, &format!("{collection}/{id}"))
                .json(&data),
        )
        .await?;
        Ok(())
    }

    async fn apply(&self, collection: &str, id: &str, op: FieldOp) -> Result<()> {
        Self::send(
            self.request(Method::POST, &format!("{collection}/{id}/ops"))
                .json(&op),
        )
        .await?;
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<Vec<String>> {
        let resp = Self::send(self.request(Method::POST, "batch").json(&batch)).await?;
        let committed: Committed = Self::json(resp).await?;
        Ok(committed.ids)
    }
}
