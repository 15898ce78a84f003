//! docpress CLI: documentation build pipeline.
//!
//! Wraps Markdown sources with HTML header/footer fragments and renders them
//! to HTML (and optionally PDF) with external converters.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
