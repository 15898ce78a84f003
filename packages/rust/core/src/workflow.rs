//! End-to-end build: docs/*.md → wrap → render → (pdf) → cleanup → report.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use docpress_shared::{
    BuildConfig, CleanupWarning, DocpressError, FailureStage, FileFailure, IntermediateDocument,
    MarkdownDocument, RenderedArtifact, Result, RunId, StylesheetSet, WorkflowReport,
};

use crate::bundle;
use crate::cleanup;
use crate::pdf::PdfStage;
use crate::renderer::{RenderJob, Renderer};
use crate::styles;
use crate::templates::TemplateFragments;
use crate::wrapper;

/// Progress callback for reporting workflow status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a source file has been wrapped.
    fn file_wrapped(&self, path: &str, current: usize, total: usize);
    /// Called after a document has been rendered.
    fn file_rendered(&self, path: &str, current: usize, total: usize);
    /// Called when a document fails; the batch continues.
    fn file_failed(&self, path: &str, error: &str);
    /// Called when the workflow completes.
    fn done(&self, report: &WorkflowReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_wrapped(&self, _path: &str, _current: usize, _total: usize) {}
    fn file_rendered(&self, _path: &str, _current: usize, _total: usize) {}
    fn file_failed(&self, _path: &str, _error: &str) {}
    fn done(&self, _report: &WorkflowReport) {}
}

/// Result of the wrap pass: one entry per discovered source, on either side.
#[derive(Debug, Default)]
pub struct WrapOutcome {
    pub intermediates: Vec<IntermediateDocument>,
    pub failures: Vec<FileFailure>,
}

/// Result of rendering a single intermediate document.
#[derive(Debug)]
pub struct RenderOutcome {
    pub artifact: RenderedArtifact,
    pub cleanup_warnings: Vec<CleanupWarning>,
}

/// A configured build run.
pub struct Workflow<R: Renderer> {
    config: BuildConfig,
    renderer: R,
    pdf: PdfStage,
    run_id: RunId,
}

impl<R: Renderer> Workflow<R> {
    pub fn new(config: BuildConfig, renderer: R, pdf: PdfStage) -> Self {
        Self {
            config,
            renderer,
            pdf,
            run_id: RunId::new(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Temp directory for this run: shared `tmp`, or `tmp/<run id>` when isolated.
    pub fn tmp_dir(&self) -> PathBuf {
        if self.config.isolate_runs {
            self.config.tmp_dir.join(self.run_id.to_string())
        } else {
            self.config.tmp_dir.clone()
        }
    }

    /// Load templates and discover sources. Both failures are fatal.
    fn prepare(&self) -> Result<(TemplateFragments, Vec<MarkdownDocument>)> {
        let fragments =
            TemplateFragments::load(&self.config.header_template, &self.config.footer_template)?;

        let docs = wrapper::discover_markdown(&self.config.input_dir)?;
        if docs.is_empty() {
            return Err(DocpressError::NoInput {
                dir: self.config.input_dir.clone(),
            });
        }
        Ok((fragments, docs))
    }

    /// Generate intermediate documents only; nothing is rendered or removed.
    ///
    /// A file that fails to wrap is recorded and skipped, as in [`Self::run`].
    #[instrument(skip_all, fields(run_id = %self.run_id))]
    pub fn wrap_only(&self, progress: &dyn ProgressReporter) -> Result<WrapOutcome> {
        progress.phase("Processing markdown files");
        let (fragments, docs) = self.prepare()?;
        let tmp_dir = self.tmp_dir();
        std::fs::create_dir_all(&tmp_dir).map_err(|e| DocpressError::io(&tmp_dir, e))?;

        Ok(self.wrap_each(&fragments, &docs, &tmp_dir, progress))
    }

    fn wrap_each(
        &self,
        fragments: &TemplateFragments,
        docs: &[MarkdownDocument],
        tmp_dir: &Path,
        progress: &dyn ProgressReporter,
    ) -> WrapOutcome {
        let total = docs.len();
        let mut outcome = WrapOutcome::default();
        for (i, doc) in docs.iter().enumerate() {
            match wrapper::wrap_document(fragments, doc, tmp_dir) {
                Ok(intermediate) => {
                    progress.file_wrapped(&display_name(&doc.path), i + 1, total);
                    outcome.intermediates.push(intermediate);
                }
                Err(e) => {
                    warn!(file = %doc.path.display(), error = %e, "wrapping failed, skipping file");
                    progress.file_failed(&display_name(&doc.path), &e.to_string());
                    outcome.failures.push(FileFailure {
                        source: doc.path.clone(),
                        intermediate: None,
                        stage: FailureStage::Wrap,
                        error: e.to_string(),
                    });
                }
            }
        }
        outcome
    }

    /// Render a single existing intermediate document.
    #[instrument(skip_all, fields(file = %intermediate.display()))]
    pub async fn render_one(
        &self,
        intermediate: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<RenderOutcome> {
        if !intermediate.is_file() {
            return Err(DocpressError::io(
                intermediate,
                std::io::Error::new(std::io::ErrorKind::NotFound, "intermediate document not found"),
            ));
        }
        let doc = IntermediateDocument {
            source: intermediate.to_path_buf(),
            path: intermediate.to_path_buf(),
        };

        progress.phase("Converting processed markdown");
        let stylesheets = self.stylesheets();
        let artifact = self.convert(&doc, &stylesheets).await.map_err(|(_, e)| e)?;

        let cleanup_warnings = if self.config.debug {
            Vec::new()
        } else {
            cleanup::remove_intermediate(&doc)
        };
        progress.file_rendered(&display_name(&artifact.html), 1, 1);
        Ok(RenderOutcome {
            artifact,
            cleanup_warnings,
        })
    }

    /// Run the full workflow.
    ///
    /// 1. Load templates, discover Markdown sources
    /// 2. Wrap each source into an intermediate document
    /// 3. Discover stylesheets
    /// 4. Render each intermediate (then PDF, then cleanup)
    /// 5. Bundle, if requested
    ///
    /// Only structural problems return `Err`. Per-file failures are recorded
    /// in the report; check [`WorkflowReport::success`].
    #[instrument(skip_all, fields(run_id = %self.run_id, input = %self.config.input_dir.display()))]
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<WorkflowReport> {
        let started_at = Utc::now();
        info!(renderer = self.renderer.name(), debug = self.config.debug, "starting document workflow");

        // --- Phase 1: Wrap ---
        progress.phase("Processing markdown files");
        let (fragments, docs) = self.prepare()?;
        let total = docs.len();
        let tmp_dir = self.tmp_dir();
        std::fs::create_dir_all(&tmp_dir).map_err(|e| DocpressError::io(&tmp_dir, e))?;

        let WrapOutcome {
            intermediates,
            mut failures,
        } = self.wrap_each(&fragments, &docs, &tmp_dir, progress);

        // --- Phase 2: Stylesheets ---
        progress.phase("Discovering stylesheets");
        let stylesheets = self.stylesheets();

        // --- Phase 3: Render ---
        progress.phase("Converting processed markdown");
        let mut converted = Vec::with_capacity(intermediates.len());
        let mut cleanup_warnings = Vec::new();

        for (i, doc) in intermediates.iter().enumerate() {
            match self.convert(doc, &stylesheets).await {
                Ok(artifact) => {
                    progress.file_rendered(&display_name(&artifact.html), i + 1, intermediates.len());
                    if !self.config.debug {
                        cleanup_warnings.extend(cleanup::remove_intermediate(doc));
                    }
                    converted.push(artifact);
                }
                Err((stage, e)) => {
                    warn!(file = %doc.path.display(), error = %e, "conversion failed, keeping intermediate");
                    progress.file_failed(&display_name(&doc.source), &e.to_string());
                    failures.push(FileFailure {
                        source: doc.source.clone(),
                        intermediate: Some(doc.path.clone()),
                        stage,
                        error: e.to_string(),
                    });
                }
            }
        }

        // --- Phase 4: Bundle ---
        let bundle = match &self.config.bundle {
            Some(path) if !converted.is_empty() => {
                progress.phase("Bundling artifacts");
                Some(bundle::write_bundle(path, &converted)?)
            }
            _ => None,
        };

        let report = WorkflowReport {
            run_id: self.run_id.clone(),
            started_at,
            finished_at: Utc::now(),
            total,
            converted,
            failures,
            cleanup_warnings,
            bundle,
        };

        progress.done(&report);

        if report.success() {
            info!(
                converted = report.converted.len(),
                failed = report.failures.len(),
                output = %self.config.output_dir.display(),
                "{}", report.summary()
            );
        } else {
            warn!(failed = report.failures.len(), "no documents were converted");
        }

        Ok(report)
    }

    fn stylesheets(&self) -> StylesheetSet {
        let set = styles::discover_stylesheets(&self.config.styles_dir, &self.config.minimal_stylesheet);
        info!(dir = %self.config.styles_dir.display(), count = set.len(), "stylesheets resolved");
        set
    }

    /// Render one intermediate document and run the PDF stage on the result.
    async fn convert(
        &self,
        doc: &IntermediateDocument,
        stylesheets: &StylesheetSet,
    ) -> std::result::Result<RenderedArtifact, (FailureStage, DocpressError)> {
        let job = RenderJob {
            input: &doc.path,
            stylesheets,
            output_dir: &self.config.output_dir,
        };
        let html = self
            .renderer
            .render(&job)
            .await
            .map_err(|e| (FailureStage::Render, e))?;

        let pdf = self
            .pdf
            .run(&html, stylesheets)
            .await
            .map_err(|e| (FailureStage::Pdf, e))?;

        let (sha256, size_bytes) = checksum(&html).map_err(|e| (FailureStage::Render, e))?;

        Ok(RenderedArtifact {
            source: doc.source.clone(),
            html,
            pdf,
            sha256,
            size_bytes,
        })
    }
}

/// SHA-256 hex digest and byte length of a file.
fn checksum(path: &Path) -> Result<(String, u64)> {
    let bytes = std::fs::read(path).map_err(|e| DocpressError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok((format!("{:x}", hasher.finalize()), bytes.len() as u64))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
