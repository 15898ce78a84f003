//! Shared types, error model, and configuration for docpress.
//!
//! This crate is the foundation depended on by all other docpress crates.
//! It provides:
//! - [`DocpressError`], the unified error type
//! - Domain types ([`MarkdownDocument`], [`IntermediateDocument`],
//!   [`StylesheetSet`], [`WorkflowReport`], [`RunId`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, BuildOverrides, CONFIG_FILE_NAME, OutputConfig, PathsConfig,
    PdfBackendKind, PdfConfig, RendererConfig, StylesConfig, TemplatesConfig, config_dir,
    executable_dir, global_config_path, init_config, load_config, load_config_from,
};
pub use error::{DocpressError, Result};
pub use types::{
    CleanupWarning, FailureStage, FileFailure, HTML_SUFFIX, INTERMEDIATE_SUFFIX,
    IntermediateDocument, MarkdownDocument, RenderedArtifact, RunId, StylesheetSet,
    WorkflowReport, artifact_name,
};
