// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Two-shot photo booth for the terminal")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booth in the terminal (default)
    Booth {
        /// Camera index to use (from 'photobooth list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Overlay PNG drawn over the composite
        #[arg(long)]
        overlay: Option<PathBuf>,
    },

    /// List available cameras
    List,

    /// Run a full two-shot capture without the terminal UI
    Capture {
        /// Camera index to use (from 'photobooth list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Output file or directory (default: ~/Pictures/PhotoBooth/photobooth.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overlay PNG drawn over the composite
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Booth { camera, overlay }) => photobooth::terminal::run(camera, overlay),
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Capture {
            camera,
            output,
            overlay,
        }) => cli::capture(camera, output, overlay),
        None => photobooth::terminal::run(None, None),
    }
}
