use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultiverseError {
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("Decode error for {url}: {message}")]
    Decode { url: String, message: String },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Unknown filter field '{field}' for {collection}")]
    UnknownField { collection: &'static str, field: String },
    #[error("Unknown record {id} in {collection}")]
    UnknownRecord { collection: &'static str, id: u64 },
}

pub type Result<T> = std::result::Result<T, MultiverseError>;

impl MultiverseError {
    pub fn transport(url: &str, message: impl Into<String>) -> Self {
        Self::Transport { url: url.to_string(), message: message.into() }
    }
    pub fn decode(url: &str, message: impl Into<String>) -> Self {
        Self::Decode { url: url.to_string(), message: message.into() }
    }
    /// The request could not be completed (including non-success statuses).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
    /// The request completed but the body was malformed.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

// Helper conversions
impl From<reqwest::Error> for MultiverseError {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        if e.is_timeout() {
            Self::Transport { url, message: "request timed out".into() }
        } else {
            Self::Transport { url, message: e.to_string() }
        }
    }
}
impl From<config::ConfigError> for MultiverseError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
