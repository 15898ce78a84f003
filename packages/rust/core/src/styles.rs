//! Stylesheet discovery.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use docpress_shared::StylesheetSet;

/// Collect `*.css` files from `css_dir`.
///
/// Ordering: the file named `minimal` first, then the rest by file name.
/// A missing or empty directory yields an empty set; rendering proceeds
/// without styles.
pub fn discover_stylesheets(css_dir: &Path, minimal: &str) -> StylesheetSet {
    let entries = match std::fs::read_dir(css_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %css_dir.display(), error = %e, "stylesheet directory unreadable, rendering without styles");
            return StylesheetSet::default();
        }
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "css") && path.is_file())
        .collect();

    sort_stylesheets(&mut found, minimal);

    for path in &found {
        debug!(path = %path.display(), "found stylesheet");
    }
    StylesheetSet::new(found)
}

/// Stable sort by `(name != minimal, name)`.
pub fn sort_stylesheets(paths: &mut [PathBuf], minimal: &str) {
    paths.sort_by(|a, b| sort_key(a, minimal).cmp(&sort_key(b, minimal)));
}

fn sort_key(path: &Path, minimal: &str) -> (bool, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (name != minimal, name)
}
