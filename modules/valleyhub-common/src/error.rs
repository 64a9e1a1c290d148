use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
