// ABOUTME: Entry point for the ecrbuildpush CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use ecrbuildpush::config;
use ecrbuildpush::error::Result;
use ecrbuildpush::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);
    if matches!(cli.command, Commands::Apply { .. } | Commands::Destroy { .. }) {
        output.start_timer();
    }

    if let Err(e) = run(cli.command, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;
    match command {
        Commands::Init {
            repository,
            image,
            tag,
            force,
        } => {
            config::init_config(
                &cwd,
                repository.as_deref(),
                image.as_deref(),
                tag.as_deref(),
                force,
            )?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Plan => commands::plan(&commands::Project::discover(&cwd)?, output),
        Commands::Apply { resource, force } => {
            commands::apply(
                &commands::Project::discover(&cwd)?,
                resource.as_deref(),
                force,
                output,
            )
            .await
        }
        Commands::Refresh => commands::refresh(&commands::Project::discover(&cwd)?, output).await,
        Commands::Destroy { resource, force } => {
            commands::destroy(
                &commands::Project::discover(&cwd)?,
                resource.as_deref(),
                force,
                output,
            )
            .await
        }
        Commands::Status => commands::status(&commands::Project::discover(&cwd)?, output),
    }
}
