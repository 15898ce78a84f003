//! Header/footer template fragments.

use std::path::Path;

use tracing::debug;

use docpress_shared::{DocpressError, Result};

/// The two HTML fragments injected around every document.
///
/// Loaded once per run and shared by reference for the rest of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFragments {
    pub header: String,
    pub footer: String,
}

impl TemplateFragments {
    /// Read both fragments. A missing or unreadable file is fatal.
    pub fn load(header: &Path, footer: &Path) -> Result<Self> {
        let fragments = Self {
            header: read_fragment(header)?,
            footer: read_fragment(footer)?,
        };
        debug!(
            header_bytes = fragments.header.len(),
            footer_bytes = fragments.footer.len(),
            "loaded template fragments"
        );
        Ok(fragments)
    }
}

fn read_fragment(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DocpressError::missing_template(path, e))
}
