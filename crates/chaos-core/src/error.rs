use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChaosError {
    #[error("invalid region '{0}': expected a name like 'us-east-1'")]
    InvalidRegion(String),

    #[error("malformed template: {0}")]
    MalformedTemplate(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChaosError>;
