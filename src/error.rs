pub type FramewarpResult<T> = Result<T, FramewarpError>;

#[derive(thiserror::Error, Debug)]
pub enum FramewarpError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramewarpError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }
}
