//! Error types for docpress.
//!
//! Library crates use [`DocpressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docpress operations.
#[derive(Debug, thiserror::Error)]
pub enum DocpressError {
    /// A header/footer template fragment is absent or unreadable.
    #[error("missing template {path:?}: {source}")]
    MissingTemplate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The Markdown input directory does not exist.
    #[error("input directory {path:?} does not exist")]
    InputDirMissing { path: PathBuf },

    /// No `*.md` files were found in the input directory.
    #[error("no markdown files found in {dir:?}")]
    NoInput { dir: PathBuf },

    /// The converter process exited with a non-zero status.
    #[error("rendering {file:?} failed (exit code {code:?}): {stderr}")]
    Render {
        file: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    /// The converter process did not finish within the configured timeout.
    #[error("rendering {file:?} timed out after {secs}s")]
    RenderTimeout { file: PathBuf, secs: u64 },

    /// The converter binary could not be spawned.
    #[error("could not run `{program}`: {message}")]
    RendererUnavailable { program: String, message: String },

    /// The PDF backend failed for a rendered HTML file.
    #[error("pdf generation for {file:?} failed: {message}")]
    Pdf { file: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Zip bundle creation error.
    #[error("bundle error: {0}")]
    Bundle(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocpressError>;

impl DocpressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a template read failure.
    pub fn missing_template(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::MissingTemplate {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingTemplate { .. }
                | Self::InputDirMissing { .. }
                | Self::NoInput { .. }
                | Self::Config { .. }
        )
    }
}
