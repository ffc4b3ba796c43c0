//! Client configuration.

use std::path::PathBuf;

/// Default API endpoint for a locally running `agora-server`.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the Agora API (no trailing slash).
    pub server_url: String,
    /// Directory holding the offline database and the saved session.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("AGORA_SERVER_URL") {
            if !url.trim().is_empty() {
                config.server_url = normalize_url(&url);
            }
        }

        if let Ok(dir) = std::env::var("AGORA_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        config
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, server_url: Option<String>, data_dir: Option<PathBuf>) -> Self {
        if let Some(url) = server_url {
            self.server_url = normalize_url(&url);
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("agora.db")
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = match agora_store::database::default_data_dir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(error = %e, "no platform data directory, using ./agora-data");
                PathBuf::from("agora-data")
            }
        };

        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            data_dir,
        }
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win() {
        let config = ClientConfig {
            server_url: DEFAULT_SERVER_URL.into(),
            data_dir: PathBuf::from("/tmp/a"),
        }
        .with_overrides(Some("https://agora.example.org/".into()), Some(PathBuf::from("/tmp/b")));

        assert_eq!(config.server_url, "https://agora.example.org");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/b/agora.db"));
        assert_eq!(config.session_path(), PathBuf::from("/tmp/b/session.json"));
    }

    #[test]
    fn no_overrides_keep_values() {
        let base = ClientConfig {
            server_url: "http://x".into(),
            data_dir: PathBuf::from("/d"),
        };
        assert_eq!(base.clone().with_overrides(None, None), base);
    }
}
