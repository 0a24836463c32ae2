use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskHiveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session connect error: {0}")]
    Connect(String),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type TaskHiveResult<T> = Result<T, TaskHiveError>;
