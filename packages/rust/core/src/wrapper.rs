//! Markdown wrapper: source document → intermediate document.
//!
//! Each source is written out as
//! `HEADER \n\n <div id="maincontent"> \n\n ORIGINAL \n\n </div> \n\n FOOTER`.
//! The blank lines inside the container keep the original parseable as
//! Markdown by the GFM reader.

use std::path::Path;

use tracing::{debug, info, instrument};

use docpress_shared::{DocpressError, IntermediateDocument, MarkdownDocument, Result};

use crate::templates::TemplateFragments;

/// Opening container marker.
pub const CONTAINER_OPEN: &str = "<div id=\"maincontent\">";

/// Closing container marker.
pub const CONTAINER_CLOSE: &str = "</div>";

/// Find `*.md` files directly inside `input_dir`, sorted by file name.
pub fn discover_markdown(input_dir: &Path) -> Result<Vec<MarkdownDocument>> {
    if !input_dir.is_dir() {
        return Err(DocpressError::InputDirMissing {
            path: input_dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(input_dir).map_err(|e| DocpressError::io(input_dir, e))?;

    let mut docs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DocpressError::io(input_dir, e))?;
        let path = entry.path();
        let is_md = path.extension().is_some_and(|ext| ext == "md");
        if is_md && path.is_file() {
            docs.push(MarkdownDocument::from_path(path));
        }
    }
    docs.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    debug!(dir = %input_dir.display(), count = docs.len(), "discovered markdown files");
    Ok(docs)
}

/// Wrap `original` with the template fragments and the content container.
///
/// Works on raw bytes: the source is copied through unmodified, whatever
/// its encoding or line endings.
pub fn wrap_content(fragments: &TemplateFragments, original: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        fragments.header.len() + original.len() + fragments.footer.len() + 48,
    );
    out.extend_from_slice(fragments.header.as_bytes());
    out.extend_from_slice(b"\n\n");
    out.extend_from_slice(CONTAINER_OPEN.as_bytes());
    out.extend_from_slice(b"\n\n");
    out.extend_from_slice(original);
    out.extend_from_slice(b"\n\n");
    out.extend_from_slice(CONTAINER_CLOSE.as_bytes());
    out.extend_from_slice(b"\n\n");
    out.extend_from_slice(fragments.footer.as_bytes());
    out
}

/// Write the intermediate document for `doc` into `tmp_dir`.
#[instrument(skip_all, fields(file = %doc.path.display()))]
pub fn wrap_document(
    fragments: &TemplateFragments,
    doc: &MarkdownDocument,
    tmp_dir: &Path,
) -> Result<IntermediateDocument> {
    std::fs::create_dir_all(tmp_dir).map_err(|e| DocpressError::io(tmp_dir, e))?;

    let original = std::fs::read(&doc.path).map_err(|e| DocpressError::io(&doc.path, e))?;
    let target = tmp_dir.join(doc.intermediate_name());

    std::fs::write(&target, wrap_content(fragments, &original))
        .map_err(|e| DocpressError::io(&target, e))?;

    info!(
        source = %doc.path.display(),
        intermediate = %target.display(),
        "wrapped markdown"
    );

    Ok(IntermediateDocument {
        source: doc.path.clone(),
        path: target,
    })
}

/// Wrap every discovered document. Stops at the first failure.
pub fn wrap_all(
    fragments: &TemplateFragments,
    docs: &[MarkdownDocument],
    tmp_dir: &Path,
) -> Result<Vec<IntermediateDocument>> {
    docs.iter()
        .map(|doc| wrap_document(fragments, doc, tmp_dir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docpress-wrap-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fragments() -> TemplateFragments {
        TemplateFragments {
            header: "<header>Site</header>".into(),
            footer: "<footer>End</footer>".into(),
        }
    }

    #[test]
    fn wrapped_layout_is_exact() {
        let original = "# Title\n\nBody with `code`.\n";
        let wrapped = wrap_content(&fragments(), original.as_bytes());

        let expected = format!(
            "<header>Site</header>\n\n<div id=\"maincontent\">\n\n{original}\n\n</div>\n\n<footer>End</footer>"
        );
        assert_eq!(wrapped, expected.into_bytes());
    }

    #[test]
    fn wrapped_parts_appear_in_order() {
        let original = "para one\n\npara two";
        let wrapped = String::from_utf8(wrap_content(&fragments(), original.as_bytes())).unwrap();

        let header_at = wrapped.find("<header>Site</header>").unwrap();
        let open_at = wrapped.find(CONTAINER_OPEN).unwrap();
        let body_at = wrapped.find(original).unwrap();
        let close_at = wrapped.rfind(CONTAINER_CLOSE).unwrap();
        let footer_at = wrapped.find("<footer>End</footer>").unwrap();

        assert_eq!(header_at, 0);
        assert!(header_at < open_at && open_at < body_at);
        assert!(body_at < close_at && close_at < footer_at);
        assert!(wrapped.ends_with("<footer>End</footer>"));
    }

    #[test]
    fn discover_is_flat_sorted_and_md_only() {
        let dir = temp_dir();
        std::fs::write(dir.join("zeta.md"), "z").unwrap();
        std::fs::write(dir.join("alpha.md"), "a").unwrap();
        std::fs::write(dir.join("notes.txt"), "n").unwrap();
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested").join("deep.md"), "d").unwrap();

        let docs = discover_markdown(&dir).unwrap();
        let stems: Vec<_> = docs.iter().map(|d| d.stem.as_str()).collect();
        assert_eq!(stems, ["alpha", "zeta"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn discover_missing_dir_errors() {
        let dir = temp_dir().join("absent");
        let err = discover_markdown(&dir).unwrap_err();
        assert!(matches!(err, DocpressError::InputDirMissing { .. }));
    }

    #[test]
    fn wrap_document_creates_tmp_dir_and_file() {
        let dir = temp_dir();
        let source = dir.join("guide.md");
        std::fs::write(&source, "# Guide\n").unwrap();
        let tmp = dir.join("work").join("tmp");

        let doc = MarkdownDocument::from_path(&source);
        let intermediate = wrap_document(&fragments(), &doc, &tmp).unwrap();

        assert_eq!(intermediate.path, tmp.join("guide.tmp.md"));
        assert_eq!(intermediate.source, source);
        let written = std::fs::read(&intermediate.path).unwrap();
        assert_eq!(written, wrap_content(&fragments(), b"# Guide\n"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wrapping_twice_is_byte_identical() {
        let dir = temp_dir();
        let source = dir.join("page.md");
        std::fs::write(&source, "Ünïcode — and\r\nCRLF lines\n").unwrap();
        let tmp = dir.join("tmp");
        let doc = MarkdownDocument::from_path(&source);

        let first = wrap_document(&fragments(), &doc, &tmp).unwrap();
        let first_bytes = std::fs::read(&first.path).unwrap();
        let second = wrap_document(&fragments(), &doc, &tmp).unwrap();
        let second_bytes = std::fs::read(&second.path).unwrap();

        assert_eq!(first_bytes, second_bytes);
        assert!(
            String::from_utf8(second_bytes)
                .unwrap()
                .contains("Ünïcode — and\r\nCRLF lines\n")
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn non_utf8_source_is_copied_through() {
        let dir = temp_dir();
        let source = dir.join("latin1.md");
        let original: &[u8] = b"caf\xe9 \xff\xfe\n";
        std::fs::write(&source, original).unwrap();
        let doc = MarkdownDocument::from_path(&source);

        let intermediate = wrap_document(&fragments(), &doc, &dir.join("tmp")).unwrap();

        let written = std::fs::read(&intermediate.path).unwrap();
        assert!(written.windows(original.len()).any(|w| w == original));
        assert_eq!(written, wrap_content(&fragments(), original));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wrap_all_produces_one_per_input() {
        let dir = temp_dir();
        let input = dir.join("docs");
        std::fs::create_dir_all(&input).unwrap();
        for name in ["a.md", "b.md", "c.md"] {
            std::fs::write(input.join(name), name).unwrap();
        }
        let docs = discover_markdown(&input).unwrap();

        let intermediates = wrap_all(&fragments(), &docs, &dir.join("tmp")).unwrap();
        assert_eq!(intermediates.len(), 3);
        for (doc, inter) in docs.iter().zip(&intermediates) {
            assert_eq!(inter.source, doc.path);
            assert!(inter.path.exists());
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
