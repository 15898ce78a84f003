//! Markdown → HTML renderer invocation.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument};

use docpress_shared::{BuildConfig, DocpressError, HTML_SUFFIX, Result, StylesheetSet, artifact_name};

use crate::process::{Invocation, ProcessError, stderr_text};

/// One document to render.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    /// Intermediate `.tmp.md` file.
    pub input: &'a Path,
    /// Stylesheets in cascade order.
    pub stylesheets: &'a StylesheetSet,
    /// Directory receiving the HTML file.
    pub output_dir: &'a Path,
}

impl RenderJob<'_> {
    /// `<output_dir>/<stem>.html`.
    pub fn html_path(&self) -> PathBuf {
        self.output_dir.join(artifact_name(self.input, HTML_SUFFIX))
    }
}

/// Converts an intermediate document into an HTML artifact.
pub trait Renderer: Send + Sync {
    /// Program name, for logs.
    fn name(&self) -> &str;

    /// Render `job`, returning the HTML path. The artifact exists on `Ok`.
    fn render(&self, job: &RenderJob<'_>) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Renderer backed by a pandoc-compatible command line.
#[derive(Debug, Clone)]
pub struct PandocRenderer {
    program: String,
    from: String,
    to: String,
    toc_depth: u8,
    page_template: PathBuf,
    timeout: Option<Duration>,
}

impl PandocRenderer {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            program: config.renderer.program.clone(),
            from: config.renderer.from.clone(),
            to: config.renderer.to.clone(),
            toc_depth: config.renderer.toc_depth,
            page_template: config.page_template.clone(),
            timeout: config.renderer.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Argument vector: input, formats, TOC, standalone, template, one
    /// `--css` pair per stylesheet in order, then the output path.
    pub fn args(&self, job: &RenderJob<'_>, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            job.input.into(),
            "--from".into(),
            self.from.clone().into(),
            "--to".into(),
            self.to.clone().into(),
            "--toc".into(),
            format!("--toc-depth={}", self.toc_depth).into(),
            "--standalone".into(),
        ];

        let mut template = OsString::from("--template=");
        template.push(&self.page_template);
        args.push(template);

        for css in job.stylesheets.paths() {
            args.push("--css".into());
            args.push(css.into());
        }

        args.push("--output".into());
        args.push(output.into());
        args
    }
}

impl Renderer for PandocRenderer {
    fn name(&self) -> &str {
        &self.program
    }

    #[instrument(skip_all, fields(file = %job.input.display()))]
    async fn render(&self, job: &RenderJob<'_>) -> Result<PathBuf> {
        std::fs::create_dir_all(job.output_dir)
            .map_err(|e| DocpressError::io(job.output_dir, e))?;

        let html = job.html_path();
        remove_stale_output(&html)?;

        let invocation = Invocation {
            program: &self.program,
            args: self.args(job, &html),
            envs: &[],
            timeout: self.timeout,
        };
        info!(command = %invocation.display(), "converting markdown to html");

        let output = invocation.run().await.map_err(|e| match e {
            ProcessError::Spawn(err) => DocpressError::RendererUnavailable {
                program: self.program.clone(),
                message: err.to_string(),
            },
            ProcessError::Timeout(limit) => DocpressError::RenderTimeout {
                file: job.input.to_path_buf(),
                secs: limit.as_secs(),
            },
        })?;

        if !output.status.success() {
            return Err(DocpressError::Render {
                file: job.input.to_path_buf(),
                code: output.status.code(),
                stderr: stderr_text(&output),
            });
        }

        if !html.is_file() {
            return Err(DocpressError::Render {
                file: job.input.to_path_buf(),
                code: output.status.code(),
                stderr: format!(
                    "{} exited successfully but did not write {}",
                    self.program,
                    html.display()
                ),
            });
        }

        debug!(html = %html.display(), "renderer finished");
        Ok(html)
    }
}

/// Delete an artifact left by an earlier run so that only this run's
/// converter output can satisfy the existence check.
pub(crate) fn remove_stale_output(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DocpressError::io(path, e)),
    }
}
