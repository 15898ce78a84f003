//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use docpress_core::pdf::PdfStage;
use docpress_core::renderer::PandocRenderer;
use docpress_core::workflow::{ProgressReporter, Workflow};
use docpress_shared::{
    AppConfig, BuildConfig, BuildOverrides, CONFIG_FILE_NAME, WorkflowReport, global_config_path,
    init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docpress: wrap Markdown in site templates and render it to HTML.
#[derive(Parser)]
#[command(
    name = "docpress",
    version,
    about = "Wrap Markdown in HTML header/footer fragments and render it with pandoc.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./docpress.toml, then ~/.docpress/docpress.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding `templates/` and `css/` (defaults to the executable's directory).
    #[arg(long, global = true, env = "DOCPRESS_ASSET_ROOT")]
    pub asset_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Wrap and render every Markdown file in the input directory.
    Build {
        /// Keep intermediate `.tmp.md` files.
        #[arg(long)]
        debug: bool,

        /// Directory of Markdown sources.
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Directory receiving HTML (and PDF) files.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also produce PDFs with weasyprint.
        #[arg(long)]
        pdf: bool,

        /// Zip the rendered files into `<output_dir>/<bundle_name>.zip`.
        #[arg(long)]
        bundle: bool,

        /// Use a per-run temp directory (`tmp/<run id>`).
        #[arg(long)]
        isolated: bool,

        /// Print the run report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate intermediate documents only.
    Wrap {
        /// Directory of Markdown sources.
        #[arg(long)]
        input_dir: Option<PathBuf>,
    },

    /// Render a single intermediate document.
    Render {
        /// Path to a `.tmp.md` file.
        file: PathBuf,

        /// Keep the intermediate file after rendering.
        #[arg(long)]
        debug: bool,

        /// Directory receiving the HTML (and PDF) file.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also produce a PDF with weasyprint.
        #[arg(long)]
        pdf: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init {
        /// Write to ~/.docpress instead of the current directory.
        #[arg(long)]
        global: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docpress=info",
        1 => "docpress=debug",
        _ => "docpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Settings shared by every subcommand.
struct Context {
    config_path: Option<PathBuf>,
    asset_root: Option<PathBuf>,
    cwd: PathBuf,
}

impl Context {
    fn load(&self) -> Result<AppConfig> {
        Ok(load_config(self.config_path.as_deref(), &self.cwd)?)
    }

    fn build_config(&self, mut overrides: BuildOverrides) -> Result<BuildConfig> {
        overrides.asset_root = self.asset_root.clone();
        Ok(BuildConfig::resolve(&self.load()?, &overrides, &self.cwd)?)
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;
    let ctx = Context {
        config_path: cli.config,
        asset_root: cli.asset_root,
        cwd,
    };

    match cli.command {
        Command::Build {
            debug,
            input_dir,
            output_dir,
            pdf,
            bundle,
            isolated,
            json,
        } => {
            let overrides = BuildOverrides {
                input_dir,
                output_dir,
                debug,
                pdf,
                bundle,
                isolated,
                ..Default::default()
            };
            cmd_build(&ctx, overrides, json).await
        }
        Command::Wrap { input_dir } => cmd_wrap(&ctx, input_dir),
        Command::Render {
            file,
            debug,
            output_dir,
            pdf,
        } => {
            let overrides = BuildOverrides {
                output_dir,
                debug,
                pdf,
                ..Default::default()
            };
            cmd_render(&ctx, &file, overrides).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init { global } => cmd_config_init(&ctx, global),
            ConfigAction::Show => cmd_config_show(&ctx),
        },
    }
}

fn workflow(config: BuildConfig) -> Workflow<PandocRenderer> {
    let renderer = PandocRenderer::from_config(&config);
    let pdf = PdfStage::from_config(&config);
    Workflow::new(config, renderer, pdf)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(ctx: &Context, overrides: BuildOverrides, json: bool) -> Result<()> {
    let config = ctx.build_config(overrides)?;
    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        debug = config.debug,
        "building documentation"
    );

    let workflow = workflow(config);
    let reporter = CliProgress::new();
    let result = workflow.run(&reporter).await;
    reporter.spinner.finish_and_clear();
    let report = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &workflow.config().output_dir);
    }

    if report.success() {
        Ok(())
    } else {
        Err(eyre!("no documents were converted"))
    }
}

fn print_report(report: &WorkflowReport, output_dir: &Path) {
    println!();
    println!("  {}", report.summary());
    println!("  Run:     {}", report.run_id);
    println!("  Output:  {}", output_dir.display());
    if let Some(bundle) = &report.bundle {
        println!("  Bundle:  {}", bundle.display());
    }
    for failure in &report.failures {
        println!("  Failed:  {} ({})", failure.source.display(), failure.error);
        if let Some(kept) = &failure.intermediate {
            println!("           kept {}", kept.display());
        }
    }
    if !report.cleanup_warnings.is_empty() {
        println!("  Cleanup warnings: {}", report.cleanup_warnings.len());
    }
    let elapsed = report.finished_at - report.started_at;
    println!(
        "  Time:    {:.1}s",
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    println!();
}

fn cmd_wrap(ctx: &Context, input_dir: Option<PathBuf>) -> Result<()> {
    let config = ctx.build_config(BuildOverrides {
        input_dir,
        ..Default::default()
    })?;
    let workflow = workflow(config);

    let reporter = CliProgress::new();
    let result = workflow.wrap_only(&reporter);
    reporter.spinner.finish_and_clear();
    let outcome = result?;

    println!();
    println!(
        "  Wrapped {} files into {}",
        outcome.intermediates.len(),
        workflow.tmp_dir().display()
    );
    for doc in &outcome.intermediates {
        println!("    {}", doc.path.display());
    }
    for failure in &outcome.failures {
        println!("  Failed:  {} ({})", failure.source.display(), failure.error);
    }
    println!();

    if outcome.intermediates.is_empty() {
        Err(eyre!("no documents were wrapped"))
    } else {
        Ok(())
    }
}

async fn cmd_render(ctx: &Context, file: &Path, overrides: BuildOverrides) -> Result<()> {
    let config = ctx.build_config(overrides)?;
    let file = if file.is_absolute() {
        file.to_path_buf()
    } else {
        ctx.cwd.join(file)
    };
    let workflow = workflow(config);

    let reporter = CliProgress::new();
    let result = workflow.render_one(&file, &reporter).await;
    reporter.spinner.finish_and_clear();
    let rendered = result?;

    println!();
    println!("  HTML:  {}", rendered.artifact.html.display());
    if let Some(pdf) = &rendered.artifact.pdf {
        println!("  PDF:   {}", pdf.display());
    }
    for warning in &rendered.cleanup_warnings {
        println!("  Cleanup warning: {warning}");
    }
    println!();
    Ok(())
}

fn cmd_config_init(ctx: &Context, global: bool) -> Result<()> {
    let target = if global {
        global_config_path()?
    } else {
        ctx.cwd.join(CONFIG_FILE_NAME)
    };
    let path = init_config(&target)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(ctx: &Context) -> Result<()> {
    let config = ctx.load()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_wrapped(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Wrapping [{current}/{total}] {path}"));
    }

    fn file_rendered(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Rendering [{current}/{total}] {path}"));
    }

    fn file_failed(&self, path: &str, error: &str) {
        self.spinner.println(format!("  ✗ {path}: {error}"));
    }

    fn done(&self, _report: &WorkflowReport) {
        self.spinner.finish_and_clear();
    }
}
