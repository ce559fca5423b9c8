/// Convenience result type used across truthpack.
pub type TruthpackResult<T> = Result<T, TruthpackError>;

/// Top-level error taxonomy used by the capture APIs.
#[derive(thiserror::Error, Debug)]
pub enum TruthpackError {
    /// Invalid camera/render configuration supplied by the host.
    #[error("camera config error: {0}")]
    Config(String),

    /// Pixel buffer dimensions inconsistent with the declared resolution.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Failure while writing or reading a per-frame archive or preview image.
    #[error("archive error: {0}")]
    Archive(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TruthpackError {
    /// Build a [`TruthpackError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TruthpackError::Shape`] value.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Build a [`TruthpackError::Archive`] value.
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }
}
