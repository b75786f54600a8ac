use crate::domain::{Civilization, PlayerId};
use crate::interface_adapters::utils::rng::generate_player_id;
use crate::use_cases::{JoinIdentity, Viewport};

use std::{env, fmt};
use url::Url;

// Runtime/client constants (not gameplay tuning).

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

pub const VIEWPORT: Viewport = Viewport {
    width: 800.0,
    height: 600.0,
    grid_spacing: 20.0,
};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8001";
const DEFAULT_CIVILIZATION: Civilization = Civilization::Britons;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidUrl { value: String, reason: String },
    UnsupportedScheme(String),
    UnknownCivilization(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{name} must be set"),
            ConfigError::InvalidUrl { value, reason } => {
                write!(f, "invalid server url {value}: {reason}")
            }
            ConfigError::UnsupportedScheme(scheme) => {
                write!(f, "unsupported server url scheme: {scheme}")
            }
            ConfigError::UnknownCivilization(value) => {
                write!(f, "unknown civilization: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub socket_url: Url,
    pub room_id: String,
    pub identity: JoinIdentity,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base = read("GAME_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let room_id = read("ROOM_ID").ok_or(ConfigError::Missing("ROOM_ID"))?;
        let name = read("PLAYER_NAME").ok_or(ConfigError::Missing("PLAYER_NAME"))?;
        let civilization = match read("CIVILIZATION") {
            Some(value) => Civilization::from_wire(&value)
                .ok_or(ConfigError::UnknownCivilization(value))?,
            None => DEFAULT_CIVILIZATION,
        };
        let player_id = read("PLAYER_ID")
            .map(PlayerId::new)
            .unwrap_or_else(generate_player_id);

        Ok(Self {
            socket_url: socket_url(&base, &room_id)?,
            room_id,
            identity: JoinIdentity {
                player_id,
                name,
                civilization,
            },
        })
    }
}

/// Room socket URL: `<base>/ws/<room_id>` with `http` mapped to `ws` and `https` to `wss`.
pub fn socket_url(base: &str, room_id: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        value: base.to_string(),
        reason,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| invalid("scheme cannot be changed".to_string()))?;

    url.path_segments_mut()
        .map_err(|_| invalid("url cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["ws", room_id]);
    Ok(url)
}
