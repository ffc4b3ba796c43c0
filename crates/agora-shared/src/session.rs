use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::models::Session;
use crate::types::UserId;

/// Sign-in request presented to the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl Credentials {
    /// Check the request and turn it into the session it would grant.
    pub fn into_session(self) -> Result<Session, AuthError> {
        let email = self.email.trim().to_string();
        let Some((local, domain)) = email.split_once('@') else {
            return Err(AuthError::Rejected("email must contain '@'".into()));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(AuthError::Rejected(format!("invalid email address: {email}")));
        }

        Ok(Session {
            id: UserId::from_email(&email),
            email,
            display_name: self.display_name.filter(|n| !n.trim().is_empty()),
            photo_ref: self.photo_ref.filter(|p| !p.trim().is_empty()),
        })
    }
}

// Token issued by the identity provider, presented as a bearer credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub session: Session,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Hex-encoded Ed25519 signature over the claims
    pub signature: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Claims<'a> {
    session: &'a Session,
    issued_at: String,
    expires_at: String,
}

fn claims_payload(
    session: &Session,
    issued_at: &DateTime<Utc>,
    expires_at: &DateTime<Utc>,
) -> Result<Vec<u8>, AuthError> {
    serde_json::to_vec(&Claims {
        session,
        issued_at: issued_at.to_rfc3339(),
        expires_at: expires_at.to_rfc3339(),
    })
    .map_err(|_| AuthError::InvalidToken)
}

impl SessionToken {
    /// Verify signature and expiry against the issuer's public key.
    pub fn verify(&self, issuer_pubkey: &[u8; 32]) -> Result<&Session, AuthError> {
        self.verify_at(issuer_pubkey, Utc::now())
    }

    pub fn verify_at(
        &self,
        issuer_pubkey: &[u8; 32],
        now: DateTime<Utc>,
    ) -> Result<&Session, AuthError> {
        if now >= self.expires_at {
            return Err(AuthError::Expired);
        }

        let verifying_key =
            VerifyingKey::from_bytes(issuer_pubkey).map_err(|_| AuthError::BadSignature)?;
        let sig_bytes = hex::decode(&self.signature).map_err(|_| AuthError::InvalidToken)?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|_| AuthError::InvalidToken)?;

        let payload = claims_payload(&self.session, &self.issued_at, &self.expires_at)?;
        verifying_key
            .verify(&payload, &signature)
            .map_err(|_| AuthError::BadSignature)?;

        Ok(&self.session)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Encode for an `Authorization: Bearer` header.
    pub fn encode(&self) -> Result<String, AuthError> {
        let json = serde_json::to_vec(self).map_err(|_| AuthError::InvalidToken)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self, AuthError> {
        let json = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|_| AuthError::InvalidToken)?;
        serde_json::from_slice(&json).map_err(|_| AuthError::InvalidToken)
    }
}

/// Body returned by `POST /auth/sign-in`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// Bearer-encoded [`SessionToken`].
    pub token: String,
    pub session: Session,
    pub expires_at: DateTime<Utc>,
}

impl SignInResponse {
    pub fn from_token(token: &SessionToken) -> Result<Self, AuthError> {
        Ok(Self {
            token: token.encode()?,
            session: token.session.clone(),
            expires_at: token.expires_at,
        })
    }
}

/// Issues signed session tokens. Held by the identity provider only.
#[derive(Clone)]
pub struct SessionSigner {
    signing_key: SigningKey,
}

impl SessionSigner {
    /// Generate a new random signing key
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restore a signer from secret key bytes
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn issue(&self, session: Session, ttl: Duration) -> Result<SessionToken, AuthError> {
        self.issue_at(session, Utc::now(), ttl)
    }

    pub fn issue_at(
        &self,
        session: Session,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<SessionToken, AuthError> {
        let expires_at = issued_at + ttl;
        let payload = claims_payload(&session, &issued_at, &expires_at)?;
        let signature = self.signing_key.sign(&payload);

        Ok(SessionToken {
            session,
            issued_at,
            expires_at,
            signature: hex::encode(signature.to_bytes()),
        })
    }
}
