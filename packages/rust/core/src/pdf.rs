//! Optional HTML → PDF stage.
//!
//! Disabled unless a backend is configured; the pipeline then ends at HTML.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, instrument};

use docpress_shared::{BuildConfig, DocpressError, PdfBackendKind, Result, StylesheetSet};

use crate::process::{Invocation, ProcessError, stderr_text};
use crate::renderer::remove_stale_output;

/// Given an HTML artifact and its stylesheets, produce a PDF artifact.
pub trait PdfBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Write `<stem>.pdf` next to `html` and return its path.
    fn render_pdf(
        &self,
        html: &Path,
        stylesheets: &StylesheetSet,
    ) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// WeasyPrint command-line backend.
#[derive(Debug, Clone)]
pub struct WeasyPrint {
    program: String,
    variant: String,
    media_type: String,
    timeout: Option<Duration>,
}

const LOCALE_ENV: &[(&str, &str)] = &[("LANG", "en_US.UTF-8"), ("LC_ALL", "en_US.UTF-8")];

impl WeasyPrint {
    pub fn new(
        program: impl Into<String>,
        variant: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            variant: variant.into(),
            media_type: media_type.into(),
            timeout: None,
        }
    }

    /// Kill the backend if it runs longer than `limit`.
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    pub fn args(&self, html: &Path, pdf: &Path, stylesheets: &StylesheetSet) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![html.into(), pdf.into()];
        for css in stylesheets.paths() {
            args.push("--stylesheet".into());
            args.push(css.into());
        }
        let base = html.parent().unwrap_or_else(|| Path::new("."));
        args.push("--base-url".into());
        args.push(base.into());
        args.push("--pdf-variant".into());
        args.push(self.variant.clone().into());
        args.push("--media-type".into());
        args.push(self.media_type.clone().into());
        args
    }
}

impl PdfBackend for WeasyPrint {
    fn name(&self) -> &str {
        &self.program
    }

    #[instrument(skip_all, fields(html = %html.display()))]
    async fn render_pdf(&self, html: &Path, stylesheets: &StylesheetSet) -> Result<PathBuf> {
        let pdf = html.with_extension("pdf");
        remove_stale_output(&pdf)?;

        let invocation = Invocation {
            program: &self.program,
            args: self.args(html, &pdf, stylesheets),
            envs: LOCALE_ENV,
            timeout: self.timeout,
        };
        info!(command = %invocation.display(), "converting html to pdf");

        let output = invocation.run().await.map_err(|e| DocpressError::Pdf {
            file: html.to_path_buf(),
            message: match e {
                ProcessError::Spawn(err) => format!("failed to start {}: {err}", self.program),
                ProcessError::Timeout(limit) => format!("timed out after {}s", limit.as_secs()),
            },
        })?;

        if !output.status.success() {
            return Err(DocpressError::Pdf {
                file: html.to_path_buf(),
                message: format!("{} failed: {}", self.program, stderr_text(&output)),
            });
        }
        if !pdf.is_file() {
            return Err(DocpressError::Pdf {
                file: html.to_path_buf(),
                message: format!(
                    "{} exited successfully but did not write {}",
                    self.program,
                    pdf.display()
                ),
            });
        }
        Ok(pdf)
    }
}

/// The configured final stage.
#[derive(Debug, Clone, Default)]
pub enum PdfStage {
    #[default]
    Disabled,
    WeasyPrint(WeasyPrint),
}

impl PdfStage {
    pub fn from_config(config: &BuildConfig) -> Self {
        match config.pdf.backend {
            PdfBackendKind::None => Self::Disabled,
            PdfBackendKind::Weasyprint => Self::WeasyPrint(
                WeasyPrint::new(&config.pdf.program, &config.pdf.variant, &config.pdf.media_type)
                    .with_timeout(config.renderer.timeout_secs.map(Duration::from_secs)),
            ),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Run the backend, or do nothing when disabled.
    pub async fn run(&self, html: &Path, stylesheets: &StylesheetSet) -> Result<Option<PathBuf>> {
        match self {
            Self::Disabled => Ok(None),
            Self::WeasyPrint(backend) => backend.render_pdf(html, stylesheets).await.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weasy(program: &str) -> WeasyPrint {
        WeasyPrint::new(program, "pdf/ua-1", "print")
    }

    #[test]
    fn args_match_backend_contract() {
        let styles = StylesheetSet::new(vec![
            PathBuf::from("/assets/css/minimal-style.css"),
            PathBuf::from("/assets/css/tokyo-night-light.css"),
        ]);
        let args: Vec<String> = weasy("weasyprint")
            .args(
                Path::new("/site/dist/guide.html"),
                Path::new("/site/dist/guide.pdf"),
                &styles,
            )
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            [
                "/site/dist/guide.html",
                "/site/dist/guide.pdf",
                "--stylesheet",
                "/assets/css/minimal-style.css",
                "--stylesheet",
                "/assets/css/tokyo-night-light.css",
                "--base-url",
                "/site/dist",
                "--pdf-variant",
                "pdf/ua-1",
                "--media-type",
                "print",
            ]
        );
    }

    #[tokio::test]
    async fn disabled_stage_is_a_no_op() {
        let stage = PdfStage::default();
        assert!(!stage.is_enabled());
        let out = stage
            .run(Path::new("dist/a.html"), &StylesheetSet::default())
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_backend_reports_pdf_error() {
        let stage = PdfStage::WeasyPrint(weasy("false"));
        let err = stage
            .run(Path::new("dist/a.html"), &StylesheetSet::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocpressError::Pdf { .. }));
    }

    // The HTML file doubles as the shell script: `sh <html> <pdf> ...`.
    #[cfg(unix)]
    async fn pdf_script(
        script: &str,
        timeout: Option<Duration>,
    ) -> (PathBuf, Result<Option<PathBuf>>) {
        let dir = std::env::temp_dir().join(format!("docpress-pdf-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let html = dir.join("a.html");
        std::fs::write(&html, script).unwrap();
        let stage = PdfStage::WeasyPrint(weasy("sh").with_timeout(timeout));
        let result = stage.run(&html, &StylesheetSet::default()).await;
        (dir, result)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_backend_returns_pdf_path() {
        let (dir, result) = pdf_script("echo '%PDF-1.7' > \"$1\"\n", None).await;
        let pdf = result.unwrap().unwrap();
        assert_eq!(pdf, dir.join("a.pdf"));
        assert!(pdf.is_file());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stale_pdf_is_not_reported_as_output() {
        let dir = std::env::temp_dir().join(format!("docpress-pdf-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let html = dir.join("a.html");
        std::fs::write(&html, "exit 0\n").unwrap();
        std::fs::write(dir.join("a.pdf"), b"%PDF old").unwrap();

        let err = PdfStage::WeasyPrint(weasy("sh"))
            .run(&html, &StylesheetSet::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocpressError::Pdf { .. }));
        assert!(!dir.join("a.pdf").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_backend_times_out() {
        let (dir, result) = pdf_script("sleep 5\n", Some(Duration::from_millis(200))).await;
        match result.unwrap_err() {
            DocpressError::Pdf { message, .. } => assert!(message.contains("timed out")),
            other => panic!("expected Pdf, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_config_carries_renderer_timeout() {
        let mut app = docpress_shared::AppConfig::default();
        app.pdf.backend = PdfBackendKind::Weasyprint;
        app.renderer.timeout_secs = Some(90);
        let overrides = docpress_shared::BuildOverrides {
            asset_root: Some(PathBuf::from("/opt/docpress")),
            ..Default::default()
        };
        let config = BuildConfig::resolve(&app, &overrides, Path::new("/work")).unwrap();

        match PdfStage::from_config(&config) {
            PdfStage::WeasyPrint(backend) => {
                assert_eq!(backend.timeout, Some(Duration::from_secs(90)));
            }
            PdfStage::Disabled => panic!("expected weasyprint stage"),
        }
    }
}
