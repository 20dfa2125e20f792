use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Any failure to reach or parse the search backend. The detail is for
    /// the log; clients must only ever see the generic form.
    #[error("Search backend unavailable: {0}")]
    Upstream(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid export payload: {0}")]
    BadExport(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
