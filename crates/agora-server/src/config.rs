//! Server configuration loaded from environment variables.
//!
//! All settings have development defaults so the server can start with zero
//! configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use agora_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_SESSION_TTL_HOURS};

#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./agora.db`
    pub database_path: PathBuf,

    /// Env: `INSTANCE_NAME`
    pub instance_name: String,

    /// Ed25519 secret key used to sign session tokens (hex, 64 chars).
    /// Env: `SESSION_SIGNING_KEY`
    /// Default: none, a random key is generated at startup and every
    /// session is lost on restart.
    pub session_signing_key: Option<[u8; 32]>,

    /// Env: `SESSION_TTL_HOURS`
    pub session_ttl_hours: i64,

    /// Request body ceiling. Posts carry inline images, so this must stay
    /// above the base64 size of a 5 MiB image.
    /// Env: `MAX_BODY_BYTES`
    /// Default: 8 MiB
    pub max_body_bytes: usize,

    /// Env: `RATE_LIMIT_PER_SEC`
    pub rate_limit_per_sec: f64,

    /// Env: `RATE_LIMIT_BURST`
    pub rate_limit_burst: f64,
}

// Never print the signing key.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("instance_name", &self.instance_name)
            .field("session_signing_key", &self.session_signing_key.map(|_| "<set>"))
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("rate_limit_per_sec", &self.rate_limit_per_sec)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./agora.db"),
            instance_name: "Agora".to_string(),
            session_signing_key: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            max_body_bytes: 8 * 1024 * 1024,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Ok(hex_key) = std::env::var("SESSION_SIGNING_KEY") {
            match parse_hex_key(&hex_key) {
                Ok(key) => config.session_signing_key = Some(key),
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid SESSION_SIGNING_KEY, generating a random key");
                }
            }
        }

        if let Some(hours) = parse_var::<i64>("SESSION_TTL_HOURS").filter(|h| *h > 0) {
            config.session_ttl_hours = hours;
        }

        if let Some(bytes) = parse_var::<usize>("MAX_BODY_BYTES") {
            config.max_body_bytes = bytes;
        }

        if let Some(rate) = parse_var::<f64>("RATE_LIMIT_PER_SEC").filter(|r| *r > 0.0) {
            config.rate_limit_per_sec = rate;
        }

        if let Some(burst) = parse_var::<f64>("RATE_LIMIT_BURST").filter(|b| *b >= 1.0) {
            config.rate_limit_burst = burst;
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(var = name, value = %value, "Invalid value, using default");
            None
        }
    }
}

/// Parse a 64-character hex string into a 32-byte key.
fn parse_hex_key(hex: &str) -> Result<[u8; 32], String> {
    let hex = hex.trim();
    if hex.len() != 64 {
        return Err(format!("expected 64 hex chars, got {}", hex.len()));
    }
    let bytes = hex::decode(hex).map_err(|e| format!("invalid hex: {e}"))?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert!(config.session_signing_key.is_none());
        assert_eq!(config.session_ttl_hours, 168);
        assert!(config.max_body_bytes > agora_shared::constants::MAX_IMAGE_SIZE * 4 / 3);
    }

    #[test]
    fn test_parse_hex_key() {
        let key = parse_hex_key(&"ab".repeat(32)).unwrap();
        assert_eq!(key, [0xab; 32]);
    }

    #[test]
    fn test_parse_hex_key_rejects_bad_input() {
        assert!(parse_hex_key("abcd").is_err());
        assert!(parse_hex_key(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let config = ServerConfig {
            session_signing_key: Some([7; 32]),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(printed.contains("<set>"));
        assert!(!printed.contains("0707"));
    }
}
