//! Error handling for kitforge
//!
//! One error type covers the whole pipeline: per-file decode failures,
//! render task failures, and archive format problems are distinct variants
//! so callers can isolate them (decode errors skip a file, render errors
//! abort one task, archive errors abort one import).

use thiserror::Error;

/// Result type alias for kitforge operations
pub type Result<T> = std::result::Result<T, KitError>;

/// Main error type for kitforge operations
#[derive(Error, Debug)]
pub enum KitError {
    // Decode Errors
    #[error("Invalid audio file: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Render Errors
    #[error("Render failed: {reason}")]
    Render { reason: String },

    #[error("Resampling failed: {from_rate} Hz -> {to_rate} Hz: {reason}")]
    Resample {
        from_rate: u32,
        to_rate: u32,
        reason: String,
    },

    // Archive Errors
    #[error("Archive format error: {reason}")]
    ArchiveFormat { reason: String },

    #[error("Unrecognized archive manifest version: {version}")]
    UnknownArchiveVersion { version: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KitError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            KitError::Decode { .. } => "DECODE_ERROR",
            KitError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            KitError::Render { .. } => "RENDER_ERROR",
            KitError::Resample { .. } => "RESAMPLE_ERROR",
            KitError::ArchiveFormat { .. } => "ARCHIVE_FORMAT_ERROR",
            KitError::UnknownArchiveVersion { .. } => "UNKNOWN_ARCHIVE_VERSION",
            KitError::Io(_) => "IO_ERROR",
            KitError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Build a decode error from a hound error
    pub fn decode(reason: impl Into<String>, source: hound::Error) -> Self {
        KitError::Decode {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a render error with a reason string
    pub fn render(reason: impl Into<String>) -> Self {
        KitError::Render {
            reason: reason.into(),
        }
    }

    /// Build an archive format error with a reason string
    pub fn archive(reason: impl Into<String>) -> Self {
        KitError::ArchiveFormat {
            reason: reason.into(),
        }
    }
}
