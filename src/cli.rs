// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ecrbuildpush")]
#[command(about = "Build Docker images and keep them in sync with Amazon ECR repositories")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only final results (for CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ecrbuildpush.yml configuration file
    Init {
        /// ECR repository name
        #[arg(short, long)]
        repository: Option<String>,

        /// Local image name
        #[arg(short, long)]
        image: Option<String>,

        /// Image tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Show what apply would do for each resource
    Plan,

    /// Build, push, retag or rebuild images to match the configuration
    Apply {
        /// Only apply this resource
        #[arg(short, long)]
        resource: Option<String>,

        /// Break a lock held by another process
        #[arg(long)]
        force: bool,
    },

    /// Refresh recorded state from the registry
    Refresh,

    /// Delete image tags from their repositories
    Destroy {
        /// Only destroy this resource
        #[arg(short, long)]
        resource: Option<String>,

        /// Break a lock held by another process
        #[arg(long)]
        force: bool,
    },

    /// Show recorded state
    Status,
}
