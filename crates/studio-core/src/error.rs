use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("Profile '{0}' already exists")]
    ProfileExists(String),

    #[error("Unknown profile field: {0}")]
    UnknownField(String),

    #[error("Agent {0} not found")]
    AgentNotFound(u64),

    #[error("Task {0} not found")]
    TaskNotFound(u64),

    #[error("Task {id} progress cannot go back from {current}% to {requested}%")]
    ProgressRegression { id: u64, current: u8, requested: u8 },

    #[error("Credential {0} not found")]
    CredentialNotFound(u64),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Model '{model}' is not offered by {provider}")]
    ModelNotOffered { provider: String, model: String },

    #[error("Saved configuration '{0}' not found")]
    ConfigNotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
