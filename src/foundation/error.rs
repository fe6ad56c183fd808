pub type SpherecastResult<T> = Result<T, SpherecastError>;

#[derive(thiserror::Error, Debug)]
pub enum SpherecastError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("scene error: {0}")]
    Scene(String),

    #[error("schedule error: {0}")]
    Schedule(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpherecastError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    pub fn schedule(msg: impl Into<String>) -> Self {
        Self::Schedule(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
