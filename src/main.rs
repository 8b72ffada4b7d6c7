mod canvas;
mod config;
mod ctl;
mod dial;
mod geometry;
mod ipc;
mod renderer;
mod time_utils;
mod wayland;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::dial::DisplayShape;

#[derive(Parser, Debug)]
#[command(name = "tickface", version, about = "Analog watch face as a Wayland layer-shell widget")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override display shape: round | rectangular
    #[arg(long)]
    shape: Option<String>,

    /// Override background image path
    #[arg(long)]
    background: Option<String>,

    /// Override IPC socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Control a running tickface instance
    Ctl(ctl::CtlArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(CliCommand::Ctl(args)) => ctl::run(args),
        None => run_daemon(cli),
    }
}

fn run_daemon(args: Cli) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Some(shell) = args.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "tickface", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path)?;

    // Apply CLI overrides
    if let Some(shape) = &args.shape {
        match DisplayShape::parse(shape) {
            Some(shape) => config.face.shape = shape,
            None => anyhow::bail!("Unknown shape: {}. Use round or rectangular", shape),
        }
    }
    if let Some(background) = args.background {
        config.background.image = background;
    }

    let (width, height) = config.face.bounds();
    log::info!("Starting tickface with shape={}, {}x{}", config.face.shape.as_str(), width, height);

    wayland::run(config, config_path, args.socket)?;

    Ok(())
}
