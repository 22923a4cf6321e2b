use thiserror::Error;

#[derive(Debug, Error)]
pub enum OncokbError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, OncokbError>;
