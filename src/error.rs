//! Error taxonomy shared by the renderer and both delivery adapters.

use std::path::PathBuf;

use thiserror::Error;

/// A context lacks one or more of the required top-level keys.
///
/// `missing` is always sorted so the message is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("context is missing required keys: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// Something the process needs before it can render anything at all.
    #[error("required rendering dependency is unavailable: {0}")]
    DependencyMissing(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("asset '{href}' could not be loaded from {}: {reason}", .path.display())]
    Asset {
        href: String,
        path: PathBuf,
        reason: String,
    },

    #[error("context serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("layout failed: {0}")]
    Layout(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn dependency(what: impl Into<String>) -> Self {
        Self::DependencyMissing(what.into())
    }

    pub fn layout(message: impl std::fmt::Display) -> Self {
        Self::Layout(message.to_string())
    }
}

impl From<tera::Error> for RenderError {
    fn from(e: tera::Error) -> Self {
        // tera nests the useful part of the message in its source chain.
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        RenderError::Template(message)
    }
}
