use std::io::ErrorKind;

use rocket::http::Status;
use thiserror::Error;

use crate::img::ImgError;
use crate::{FileKind, PreviewSize};

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Authentication failed: {0}")]
    Unauthorized(String),
    #[error("Invalid preview size: {0}")]
    InvalidSize(String),
    #[error("Preview size {0} is disabled")]
    Disabled(PreviewSize),
    #[error("Can't create preview for {0} type")]
    NotImplemented(FileKind),
    #[error(transparent)]
    Image(#[from] ImgError),
    #[error("Cache error: {0}")]
    Cache(String),
}

impl PreviewError {
    /// HTTP status a failed preview request is answered with.
    pub fn status(&self) -> Status {
        match self {
            PreviewError::Io(err) => io_status(err.kind()),
            PreviewError::NotFound(_) => Status::NotFound,
            PreviewError::PermissionDenied(_) => Status::Forbidden,
            PreviewError::Unauthorized(_) => Status::Unauthorized,
            PreviewError::InvalidSize(_) | PreviewError::Disabled(_) => Status::BadRequest,
            PreviewError::NotImplemented(_) => Status::NotImplemented,
            PreviewError::Image(ImgError::UnsupportedFormat) => Status::BadRequest,
            PreviewError::Image(ImgError::Io(err)) => io_status(err.kind()),
            PreviewError::Image(_) | PreviewError::Cache(_) => Status::InternalServerError,
        }
    }
}

fn io_status(kind: ErrorKind) -> Status {
    match kind {
        ErrorKind::NotFound => Status::NotFound,
        ErrorKind::PermissionDenied => Status::Forbidden,
        ErrorKind::InvalidInput => Status::BadRequest,
        ErrorKind::AlreadyExists => Status::Conflict,
        _ => Status::InternalServerError,
    }
}

pub type Result<T> = std::result::Result<T, PreviewError>;
