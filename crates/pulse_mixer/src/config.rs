//! Client Configuration

use serde::{Deserialize, Serialize};

use crate::error::{MixerError, MixerResult};

/// Environment variable overriding the client name shown by the server
pub const ENV_CLIENT_NAME: &str = "LUA_PULSEAUDIO_CLIENT_NAME";

/// Environment variable selecting the server to connect to
pub const ENV_SERVER: &str = "LUA_PULSEAUDIO_SERVER";

/// Connection settings for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Application name announced to the server
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Server address; `None` uses the library default (`PULSE_SERVER`, then
    /// the per-user socket)
    #[serde(default)]
    pub server: Option<String>,
}

fn default_client_name() -> String {
    "lua_pulseaudio".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            server: None,
        }
    }
}

impl ClientConfig {
    /// Build a configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            client_name: non_empty(ENV_CLIENT_NAME).unwrap_or_else(default_client_name),
            server: non_empty(ENV_SERVER),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> MixerResult<()> {
        if self.client_name.trim().is_empty() {
            return Err(MixerError::InvalidConfiguration(
                "client name is empty".into(),
            ));
        }
        if self.client_name.contains('\0') {
            return Err(MixerError::InvalidConfiguration(
                "client name contains NUL".into(),
            ));
        }
        if let Some(server) = &self.server {
            if server.trim().is_empty() {
                return Err(MixerError::InvalidConfiguration(
                    "server address is empty".into(),
                ));
            }
            if server.contains('\0') {
                return Err(MixerError::InvalidConfiguration(
                    "server address contains NUL".into(),
                ));
            }
        }
        Ok(())
    }
}
