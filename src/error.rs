use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Non-2xx response other than 401, with the message pulled from the body.
    #[error("{message} ({status})")]
    Api { status: u16, message: String },

    #[error("Not logged in")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
