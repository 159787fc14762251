//! Core error types for diagram building and rendering
//!
//! Every failure aborts the current diagram. There is no recoverable path:
//! either the complete image is written or no file is.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, DiagramError>;

/// Core error types for diagram processing
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Declaration error: {message}")]
    DeclarationError { message: String },

    #[error("Render backend unavailable: could not run '{program}': {source}")]
    RenderBackendUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("IO error on '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Description error: {message}")]
    DescriptionError { message: String },
}

impl DiagramError {
    /// Create a new declaration error
    pub fn declaration_error(message: impl Into<String>) -> Self {
        Self::DeclarationError {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render_error(message: impl Into<String>) -> Self {
        Self::RenderError {
            message: message.into(),
        }
    }

    /// Create a new IO error bound to the path it happened on
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a new description error
    pub fn description_error(message: impl Into<String>) -> Self {
        Self::DescriptionError {
            message: message.into(),
        }
    }

    /// Returns true if this is a declaration error
    pub fn is_declaration(&self) -> bool {
        matches!(self, Self::DeclarationError { .. })
    }
}

impl From<serde_json::Error> for DiagramError {
    fn from(err: serde_json::Error) -> Self {
        Self::description_error(err.to_string())
    }
}
