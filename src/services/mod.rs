//! Toolkit services: uploads, JSON codec and the small helpers around them.
pub mod classifier;
pub mod json;
pub mod remote;
pub mod slug;
pub mod storage;
pub mod token;
pub mod upload;

use crate::domain::{ByteSize, TypeConstraintError};

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("{message}")]
    PayloadTooLarge { message: String, limit: u64 },
    #[error("the type {0} of uploaded file is not permitted")]
    UnsupportedType(String),
    #[error("failed to prepare upload directory")]
    StorageSetup(#[source] std::io::Error),
    #[error("failed to buffer uploaded file")]
    Spool(#[source] std::io::Error),
    #[error("failed to save file")]
    SaveFile(#[source] std::io::Error),
    #[error("failed to open file")]
    OpenFile(#[source] std::io::Error),
    #[error("malformed multipart body: {0}")]
    Multipart(String),
    #[error("no files were uploaded")]
    NoFiles,
    #[error("invalid file name")]
    InvalidFileName,
    #[error("{0}")]
    MalformedJson(String),
    #[error("body contains unknown key \"{0}\"")]
    UnknownField(String),
    #[error("body must only contain a single JSON value")]
    TrailingData,
    #[error("failed to read request body: {0}")]
    ReadBody(String),
    #[error("failed to encode JSON")]
    EncodeJson(#[source] serde_json::Error),
    #[error("invalid form input: {0}")]
    Validation(String),
    #[error("{0}")]
    InvalidSlug(&'static str),
    #[error("failed to push JSON to remote")]
    Remote(#[source] reqwest::Error),
}

impl ServiceError {
    pub(crate) fn upload_too_large(limit: u64) -> Self {
        Self::PayloadTooLarge {
            message: format!(
                "the uploaded file is too big, max size is {}",
                ByteSize::new(limit)
            ),
            limit,
        }
    }

    pub(crate) fn body_too_large(limit: u64) -> Self {
        Self::PayloadTooLarge {
            message: format!("body must not be larger than {limit} bytes"),
            limit,
        }
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        match err {
            TypeConstraintError::InvalidFileName => Self::InvalidFileName,
        }
    }
}
