//! Build pipeline for docpress.
//!
//! Wraps Markdown sources in the site's header/footer fragments, renders
//! them to HTML through an external converter, optionally prints PDFs, and
//! cleans up after itself. [`workflow::Workflow`] runs the whole thing.

pub mod bundle;
pub mod cleanup;
pub mod pdf;
mod process;
pub mod renderer;
pub mod styles;
pub mod templates;
pub mod workflow;
pub mod wrapper;
