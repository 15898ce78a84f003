//! Core domain types for a docpress build run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suffix of intermediate (wrapped) Markdown files.
pub const INTERMEDIATE_SUFFIX: &str = ".tmp.md";

/// Extension of rendered HTML artifacts.
pub const HTML_SUFFIX: &str = ".html";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one workflow run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A user-authored Markdown source file. Read-only to docpress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownDocument {
    /// Path to the `.md` file.
    pub path: PathBuf,
    /// File name without the `.md` extension.
    pub stem: String,
}

impl MarkdownDocument {
    /// Build a document from its path, deriving the stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, stem }
    }

    /// File name of the intermediate document generated for this source.
    pub fn intermediate_name(&self) -> String {
        format!("{}{INTERMEDIATE_SUFFIX}", self.stem)
    }
}

/// A wrapped copy of a [`MarkdownDocument`] awaiting rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntermediateDocument {
    /// The Markdown file this was generated from.
    pub source: PathBuf,
    /// Location of the `<stem>.tmp.md` file.
    pub path: PathBuf,
}

impl IntermediateDocument {
    /// Rendered file name: the intermediate suffix replaced by `ext`.
    ///
    /// `guide.tmp.md` with `.html` becomes `guide.html`. Names without the
    /// intermediate suffix just get `ext` appended to their stem.
    pub fn artifact_name(&self, ext: &str) -> String {
        artifact_name(&self.path, ext)
    }
}

/// Derive an artifact file name from an intermediate path.
pub fn artifact_name(path: &Path, ext: &str) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(INTERMEDIATE_SUFFIX) {
        Some(stem) => format!("{stem}{ext}"),
        None => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(name);
            format!("{stem}{ext}")
        }
    }
}

// ---------------------------------------------------------------------------
// StylesheetSet
// ---------------------------------------------------------------------------

/// Ordered stylesheets passed to the renderer.
///
/// Order is cascade order: the minimal/reset sheet comes first so later
/// sheets can override it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StylesheetSet(Vec<PathBuf>);

impl StylesheetSet {
    /// Wrap an already-ordered list.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self(paths)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// File names in order, for logging and assertions.
    pub fn file_names(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

/// A successfully rendered document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedArtifact {
    /// Original Markdown source.
    pub source: PathBuf,
    /// Rendered HTML file.
    pub html: PathBuf,
    /// PDF file, when the PDF stage is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PathBuf>,
    /// SHA-256 of the HTML output.
    pub sha256: String,
    /// Size of the HTML output in bytes.
    pub size_bytes: u64,
}

/// Pipeline stage at which a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Wrap,
    Render,
    Pdf,
}

/// A per-file failure recorded by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// Original Markdown source.
    pub source: PathBuf,
    /// Intermediate document retained for inspection, if one was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate: Option<PathBuf>,
    pub stage: FailureStage,
    /// Rendered error message (includes converter stderr).
    pub error: String,
}

/// A non-fatal failure to remove an intermediate file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not remove {}: {}", self.path.display(), self.message)
    }
}

/// Aggregate result of a workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of Markdown files discovered.
    pub total: usize,
    pub converted: Vec<RenderedArtifact>,
    pub failures: Vec<FileFailure>,
    pub cleanup_warnings: Vec<CleanupWarning>,
    /// Zip bundle written for this run, if requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<PathBuf>,
}

impl WorkflowReport {
    /// A run succeeds when at least one file was converted.
    pub fn success(&self) -> bool {
        !self.converted.is_empty()
    }

    /// Human-readable count, e.g. `"2 of 3 files converted"`.
    pub fn summary(&self) -> String {
        format!("{} of {} files converted", self.converted.len(), self.total)
    }
}
