//! Zip bundle of a run's rendered artifacts.
//!
//! Layout:
//! ```text
//! docs.zip
//! ├── html/<stem>.html
//! └── pdf/<stem>.pdf
//! ```

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use docpress_shared::{DocpressError, RenderedArtifact, Result};

/// Pack the HTML (and PDF, if any) of each artifact into `bundle_path`.
#[instrument(skip_all, fields(bundle = %bundle_path.display(), artifacts = artifacts.len()))]
pub fn write_bundle(bundle_path: &Path, artifacts: &[RenderedArtifact]) -> Result<PathBuf> {
    if let Some(dir) = bundle_path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| DocpressError::io(dir, e))?;
    }
    let file = File::create(bundle_path).map_err(|e| DocpressError::io(bundle_path, e))?;
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for artifact in artifacts {
        add_file(&mut zip, options, "html", &artifact.html)?;
        if let Some(pdf) = &artifact.pdf {
            add_file(&mut zip, options, "pdf", pdf)?;
        }
    }

    zip.finish()
        .map_err(|e| DocpressError::Bundle(format!("finalizing {}: {e}", bundle_path.display())))?;

    info!(path = %bundle_path.display(), "bundle written");
    Ok(bundle_path.to_path_buf())
}

fn add_file<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    options: SimpleFileOptions,
    folder: &str,
    path: &Path,
) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| DocpressError::Bundle(format!("{} has no file name", path.display())))?;
    let data = std::fs::read(path).map_err(|e| DocpressError::io(path, e))?;

    zip.start_file(format!("{folder}/{name}"), options)
        .map_err(|e| DocpressError::Bundle(e.to_string()))?;
    zip.write_all(&data)
        .map_err(|e| DocpressError::io(path, e))?;
    Ok(())
}
