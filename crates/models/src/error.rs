use std::path::PathBuf;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Coarse failure category; both are fatal and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Detector or backbone could not be constructed from its configuration.
    Configuration,
    /// A caller passed a value outside an operation's contract.
    InvalidArgument,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown backbone `{0}`")]
    UnknownBackbone(String),
    #[error("backbone family `{family}` is not supported (requested `{name}`)")]
    UnsupportedBackbone { family: &'static str, name: String },
    #[error("unknown backbone stage `{0}`")]
    UnknownStage(String),
    #[error("no feature stages requested")]
    NoFeatureStages,
    #[error("detector needs at least one class")]
    NoClasses,
    #[error("duplicate class name `{0}`")]
    DuplicateClass(String),
    #[error("pretrained weights not found at {path}")]
    MissingWeights { path: PathBuf },
    #[error("failed to load weights from {path}: {reason}")]
    Weights { path: PathBuf, reason: String },
    #[error("fixed stage count must be in 0..=3, got {0}")]
    InvalidFixedStages(usize),
    #[error("cannot thaw backbone: {current} extra stages already fixed, requested {requested}")]
    ThawRejected { current: usize, requested: usize },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::InvalidFixedStages(_) | ModelError::ThawRejected { .. } => {
                ErrorKind::InvalidArgument
            }
            _ => ErrorKind::Configuration,
        }
    }
}
