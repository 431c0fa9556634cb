use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("error serializing/deserializing JSON: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("gate chain needs {stages} stages, but at most {max} are supported")]
    TooManyStages { stages: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("incomplete parameters: {0}")]
    Builder(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
