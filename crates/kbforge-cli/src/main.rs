//! kbforge CLI - Command-line interface for relation knowledge graph extraction.

use clap::Parser;
use kbforge_cli::commands;
use kbforge_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins unless `--verbose` is given
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> kbforge_cli::Result<Config> {
    if let Some(path) = &cli.config {
        return Config::load_from(path);
    }

    // First run: write the defaults so they can be edited
    let path = Config::path()?;
    let config = Config::load_from(&path)?;
    if !path.exists() {
        if let Err(e) = config.save_to(&path) {
            tracing::warn!("Could not write default config to {}: {}", path.display(), e);
        }
    }
    Ok(config)
}

async fn run(cli: Cli) -> kbforge_cli::Result<()> {
    let config = load_config(&cli)?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Import(args) => commands::execute_import(args, &config, &formatter)?,
        Command::Submit(args) => commands::execute_submit(args, &config, &formatter).await?,
        Command::Status(args) => commands::execute_status(args, &config, &formatter)?,
        Command::Latest => commands::execute_latest(&config, &formatter)?,
        Command::Show(args) => commands::execute_show(args, &config, &formatter)?,
        Command::Retry(args) => commands::execute_retry(args, &config, &formatter)?,
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await?,
        Command::Work => commands::execute_work(&config, &formatter).await?,
    }

    Ok(())
}
