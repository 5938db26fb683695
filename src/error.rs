use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Run(#[from] crate::run::RunError),

    #[error(transparent)]
    Api(#[from] crate::providers::ApiError),

    #[error("output serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
