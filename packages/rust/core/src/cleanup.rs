//! Removal of intermediate documents after a successful render.

use std::path::Path;

use tracing::{debug, warn};

use docpress_shared::{CleanupWarning, IntermediateDocument};

/// Delete `doc`'s file and, if that leaves its directory empty, the
/// directory too. Failures are returned as warnings, never as errors.
pub fn remove_intermediate(doc: &IntermediateDocument) -> Vec<CleanupWarning> {
    let mut warnings = Vec::new();

    match std::fs::remove_file(&doc.path) {
        Ok(()) => debug!(path = %doc.path.display(), "removed intermediate document"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warnings.push(warning(&doc.path, &e)),
    }

    if let Some(dir) = doc.path.parent() {
        if let Some(w) = remove_dir_if_empty(dir) {
            warnings.push(w);
        }
    }

    for w in &warnings {
        warn!(path = %w.path.display(), reason = %w.message, "cleanup failed");
    }
    warnings
}

/// Remove `dir` only when it has no entries left.
fn remove_dir_if_empty(dir: &Path) -> Option<CleanupWarning> {
    let mut entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => return Some(warning(dir, &e)),
    };
    if entries.next().is_some() {
        return None;
    }

    match std::fs::remove_dir(dir) {
        Ok(()) => {
            debug!(dir = %dir.display(), "removed empty temp directory");
            None
        }
        Err(e) => Some(warning(dir, &e)),
    }
}

fn warning(path: &Path, err: &std::io::Error) -> CleanupWarning {
    CleanupWarning {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docpress-clean-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn intermediate(tmp: &Path, stem: &str) -> IntermediateDocument {
        let path = tmp.join(format!("{stem}.tmp.md"));
        std::fs::write(&path, "wrapped").unwrap();
        IntermediateDocument {
            source: PathBuf::from(format!("docs/{stem}.md")),
            path,
        }
    }

    #[test]
    fn removes_file_and_empty_dir() {
        let root = temp_dir();
        let tmp = root.join("tmp");
        std::fs::create_dir_all(&tmp).unwrap();
        let doc = intermediate(&tmp, "only");

        let warnings = remove_intermediate(&doc);
        assert!(warnings.is_empty());
        assert!(!doc.path.exists());
        assert!(!tmp.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn keeps_dir_with_remaining_intermediates() {
        let root = temp_dir();
        let tmp = root.join("tmp");
        std::fs::create_dir_all(&tmp).unwrap();
        let first = intermediate(&tmp, "first");
        let second = intermediate(&tmp, "second");

        assert!(remove_intermediate(&first).is_empty());
        assert!(!first.path.exists());
        assert!(second.path.exists());
        assert!(tmp.exists());

        assert!(remove_intermediate(&second).is_empty());
        assert!(!tmp.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn already_removed_file_is_not_a_warning() {
        let root = temp_dir();
        let tmp = root.join("tmp");
        std::fs::create_dir_all(&tmp).unwrap();
        let doc = intermediate(&tmp, "gone");
        std::fs::remove_file(&doc.path).unwrap();
        std::fs::write(tmp.join("other.tmp.md"), "x").unwrap();

        assert!(remove_intermediate(&doc).is_empty());
        assert!(tmp.exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
