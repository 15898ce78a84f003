//! Application configuration for docpress.
//!
//! Project config lives at `./docpress.toml`; a user-wide fallback lives at
//! `~/.docpress/docpress.toml`. CLI flags override config file values, which
//! override defaults.
//!
//! Path rule: templates and stylesheets resolve against the asset root (the
//! tool's installation directory unless overridden); input, temp, and output
//! directories resolve against the caller's working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocpressError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "docpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docpress";

/// Directory under the asset root holding HTML fragments and the page template.
const TEMPLATES_DIR_NAME: &str = "templates";

// ---------------------------------------------------------------------------
// Config structs (matching docpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub pdf: PdfConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of source Markdown files (caller-relative).
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Directory for rendered artifacts (caller-relative).
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Working directory for intermediate documents (caller-relative).
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: String,

    /// Root holding `templates/` and `css/`. Defaults to the executable's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_root: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            tmp_dir: default_tmp_dir(),
            asset_root: None,
        }
    }
}

fn default_input_dir() -> String {
    "docs".into()
}
fn default_output_dir() -> String {
    "dist".into()
}
fn default_tmp_dir() -> String {
    "tmp".into()
}

/// `[templates]` section. File names inside `<asset_root>/templates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_header")]
    pub header: String,

    #[serde(default = "default_footer")]
    pub footer: String,

    /// Page template handed to the renderer via `--template`.
    #[serde(default = "default_page_template")]
    pub page: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
            footer: default_footer(),
            page: default_page_template(),
        }
    }
}

fn default_header() -> String {
    "before-template.html".into()
}
fn default_footer() -> String {
    "after-template.html".into()
}
fn default_page_template() -> String {
    "custom.html".into()
}

/// `[styles]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Stylesheet directory under the asset root.
    #[serde(default = "default_styles_dir")]
    pub dir: String,

    /// Stylesheet that always sorts first.
    #[serde(default = "default_minimal")]
    pub minimal: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            dir: default_styles_dir(),
            minimal: default_minimal(),
        }
    }
}

fn default_styles_dir() -> String {
    "css".into()
}
fn default_minimal() -> String {
    "minimal-style.css".into()
}

/// `[renderer]` section: the Markdown-to-HTML converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_renderer_program")]
    pub program: String,

    /// Source format selector.
    #[serde(default = "default_from")]
    pub from: String,

    /// Target format selector.
    #[serde(default = "default_to")]
    pub to: String,

    #[serde(default = "default_toc_depth")]
    pub toc_depth: u8,

    /// Kill the converter (and the PDF backend) after this many seconds.
    /// Unset means wait forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: default_renderer_program(),
            from: default_from(),
            to: default_to(),
            toc_depth: default_toc_depth(),
            timeout_secs: None,
        }
    }
}

fn default_renderer_program() -> String {
    "pandoc".into()
}
fn default_from() -> String {
    "gfm".into()
}
fn default_to() -> String {
    "html5".into()
}
fn default_toc_depth() -> u8 {
    3
}

/// Which PDF backend, if any, runs after HTML rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfBackendKind {
    #[default]
    None,
    Weasyprint,
}

/// `[pdf]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    #[serde(default)]
    pub backend: PdfBackendKind,

    #[serde(default = "default_pdf_program")]
    pub program: String,

    #[serde(default = "default_pdf_variant")]
    pub variant: String,

    #[serde(default = "default_media_type")]
    pub media_type: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            backend: PdfBackendKind::None,
            program: default_pdf_program(),
            variant: default_pdf_variant(),
            media_type: default_media_type(),
        }
    }
}

fn default_pdf_program() -> String {
    "weasyprint".into()
}
fn default_pdf_variant() -> String {
    "pdf/ua-1".into()
}
fn default_media_type() -> String {
    "print".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Use a per-run `tmp/<run id>` directory instead of the shared `tmp`.
    #[serde(default)]
    pub isolate_runs: bool,

    /// Pack converted artifacts into a zip after the run.
    #[serde(default)]
    pub bundle: bool,

    /// Zip file name (without extension) inside the output directory.
    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            isolate_runs: false,
            bundle: false,
            bundle_name: default_bundle_name(),
        }
    }
}

fn default_bundle_name() -> String {
    "docs".into()
}

impl AppConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.renderer.toc_depth) {
            return Err(DocpressError::config(format!(
                "renderer.toc_depth must be between 1 and 6, got {}",
                self.renderer.toc_depth
            )));
        }
        if self.renderer.program.trim().is_empty() {
            return Err(DocpressError::config("renderer.program must not be empty"));
        }
        if self.renderer.timeout_secs == Some(0) {
            return Err(DocpressError::config("renderer.timeout_secs must be positive"));
        }
        if self.pdf.backend != PdfBackendKind::None && self.pdf.program.trim().is_empty() {
            return Err(DocpressError::config("pdf.program must not be empty"));
        }
        if self.output.bundle_name.trim().is_empty() {
            return Err(DocpressError::config("output.bundle_name must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Per-invocation overrides collected from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub asset_root: Option<PathBuf>,
    pub debug: bool,
    pub pdf: bool,
    pub bundle: bool,
    pub isolated: bool,
}

/// Runtime build configuration with every path resolved.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tmp_dir: PathBuf,
    /// `<asset_root>/templates/<header>`.
    pub header_template: PathBuf,
    /// `<asset_root>/templates/<footer>`.
    pub footer_template: PathBuf,
    /// `<asset_root>/templates/<page>`.
    pub page_template: PathBuf,
    /// `<asset_root>/<styles.dir>`.
    pub styles_dir: PathBuf,
    pub minimal_stylesheet: String,
    pub renderer: RendererConfig,
    pub pdf: PdfConfig,
    /// Keep intermediate documents after rendering.
    pub debug: bool,
    pub isolate_runs: bool,
    /// Zip path to write after the run, if bundling is enabled.
    pub bundle: Option<PathBuf>,
}

impl BuildConfig {
    /// Merge file config and CLI overrides, resolving paths against `cwd`
    /// (caller-relative) and `asset_root` (tool-relative).
    pub fn resolve(config: &AppConfig, overrides: &BuildOverrides, cwd: &Path) -> Result<Self> {
        config.validate()?;

        let asset_root = match (&overrides.asset_root, &config.paths.asset_root) {
            (Some(root), _) => absolutize(cwd, root),
            (None, Some(root)) => absolutize(cwd, Path::new(root)),
            (None, None) => executable_dir()?,
        };
        let templates = asset_root.join(TEMPLATES_DIR_NAME);

        let input_dir = overrides
            .input_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.paths.input_dir));
        let output_dir = overrides
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.paths.output_dir));
        let output_dir = absolutize(cwd, &output_dir);

        let mut pdf = config.pdf.clone();
        if overrides.pdf && pdf.backend == PdfBackendKind::None {
            pdf.backend = PdfBackendKind::Weasyprint;
        }

        let bundle = (overrides.bundle || config.output.bundle)
            .then(|| output_dir.join(format!("{}.zip", config.output.bundle_name)));

        Ok(Self {
            input_dir: absolutize(cwd, &input_dir),
            tmp_dir: absolutize(cwd, Path::new(&config.paths.tmp_dir)),
            output_dir,
            header_template: templates.join(&config.templates.header),
            footer_template: templates.join(&config.templates.footer),
            page_template: templates.join(&config.templates.page),
            styles_dir: asset_root.join(&config.styles.dir),
            minimal_stylesheet: config.styles.minimal.clone(),
            renderer: config.renderer.clone(),
            pdf,
            debug: overrides.debug,
            isolate_runs: overrides.isolated || config.output.isolate_runs,
            bundle,
        })
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Directory containing the running executable, the default asset root.
pub fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| DocpressError::config(format!("cannot locate executable: {e}")))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| DocpressError::config("executable has no parent directory"))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.docpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocpressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.docpress/docpress.toml`).
pub fn global_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load config: explicit path, else `<cwd>/docpress.toml`, else the user
/// config, else defaults.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return load_config_from(&local);
    }

    match global_config_path() {
        Ok(path) if path.is_file() => load_config_from(&path),
        _ => {
            tracing::debug!("no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocpressError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        DocpressError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Write a default config file to `path`, creating parent directories.
/// Refuses to overwrite an existing file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(DocpressError::config(format!(
            "{} already exists",
            path.display()
        )));
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| DocpressError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| DocpressError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| DocpressError::io(path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docpress-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("input_dir"));
        assert!(toml_str.contains("minimal-style.css"));
        assert!(toml_str.contains("pandoc"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.renderer.toc_depth, 3);
        assert_eq!(parsed.paths.output_dir, "dist");
        assert_eq!(parsed.pdf.backend, PdfBackendKind::None);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
input_dir = "handbook"

[pdf]
backend = "weasyprint"

[renderer]
timeout_secs = 30
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.input_dir, "handbook");
        assert_eq!(config.paths.tmp_dir, "tmp");
        assert_eq!(config.pdf.backend, PdfBackendKind::Weasyprint);
        assert_eq!(config.pdf.variant, "pdf/ua-1");
        assert_eq!(config.renderer.timeout_secs, Some(30));
        assert_eq!(config.templates.header, "before-template.html");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.renderer.toc_depth = 0;
        assert!(config.validate().unwrap_err().to_string().contains("toc_depth"));

        let mut config = AppConfig::default();
        config.renderer.timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.renderer.program = "  ".into();
        assert!(config.validate().is_err());

        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn resolve_uses_caller_and_asset_roots() {
        let cwd = PathBuf::from("/work/project");
        let overrides = BuildOverrides {
            asset_root: Some(PathBuf::from("/opt/docpress")),
            ..Default::default()
        };

        let build = BuildConfig::resolve(&AppConfig::default(), &overrides, &cwd).unwrap();
        assert_eq!(build.input_dir, cwd.join("docs"));
        assert_eq!(build.output_dir, cwd.join("dist"));
        assert_eq!(build.tmp_dir, cwd.join("tmp"));
        assert_eq!(
            build.header_template,
            PathBuf::from("/opt/docpress/templates/before-template.html")
        );
        assert_eq!(
            build.page_template,
            PathBuf::from("/opt/docpress/templates/custom.html")
        );
        assert_eq!(build.styles_dir, PathBuf::from("/opt/docpress/css"));
        assert!(build.bundle.is_none());
        assert!(!build.debug);
    }

    #[test]
    fn resolve_applies_cli_overrides() {
        let cwd = PathBuf::from("/work/project");
        let overrides = BuildOverrides {
            input_dir: Some(PathBuf::from("handbook")),
            output_dir: Some(PathBuf::from("/srv/site")),
            asset_root: Some(PathBuf::from("assets")),
            debug: true,
            pdf: true,
            bundle: true,
            isolated: true,
        };

        let build = BuildConfig::resolve(&AppConfig::default(), &overrides, &cwd).unwrap();
        assert_eq!(build.input_dir, cwd.join("handbook"));
        assert_eq!(build.output_dir, PathBuf::from("/srv/site"));
        assert_eq!(build.styles_dir, cwd.join("assets/css"));
        assert_eq!(build.pdf.backend, PdfBackendKind::Weasyprint);
        assert_eq!(build.bundle, Some(PathBuf::from("/srv/site/docs.zip")));
        assert!(build.debug);
        assert!(build.isolate_runs);
    }

    #[test]
    fn load_prefers_local_file() {
        let dir = temp_dir();
        std::fs::write(
            dir.join(CONFIG_FILE_NAME),
            "[paths]\noutput_dir = \"public\"\n",
        )
        .unwrap();

        let config = load_config(None, &dir).unwrap();
        assert_eq!(config.paths.output_dir, "public");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = temp_dir();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "[renderer\nprogram = ").unwrap();

        let err = load_config(Some(&path), &dir).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn init_writes_defaults_once() {
        let dir = temp_dir();
        let path = dir.join("nested").join(CONFIG_FILE_NAME);

        init_config(&path).unwrap();
        let parsed = load_config_from(&path).unwrap();
        assert_eq!(parsed.styles.minimal, "minimal-style.css");

        assert!(init_config(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
