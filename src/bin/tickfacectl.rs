use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tickfacectl", version, about = "Control the tickface watch face widget")]
struct Cli {
    /// Override socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set or toggle the display shape
    Shape {
        /// round, rectangular, or toggle
        mode: String,
    },
    /// Reload configuration file
    Reload,
    /// Print current state as JSON
    State,
    /// Shut down tickface
    Quit,
}

fn socket_path(override_path: Option<&PathBuf>) -> PathBuf {
    if let Some(p) = override_path {
        return p.clone();
    }
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(dir).join("tickface.sock")
    } else {
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/tickface-{}.sock", uid))
    }
}

fn send_command(socket: &PathBuf, cmd: serde_json::Value) -> Result<serde_json::Value> {
    let mut stream = UnixStream::connect(socket)
        .with_context(|| format!("Failed to connect to tickface at {}", socket.display()))?;

    let msg = serde_json::to_string(&cmd)? + "\n";
    stream.write_all(msg.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut response = String::new();
    reader.read_line(&mut response)?;

    let resp: serde_json::Value = serde_json::from_str(&response)
        .context("Failed to parse response from tickface")?;
    Ok(resp)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sock = socket_path(cli.socket.as_ref());

    let cmd = match &cli.command {
        Commands::Shape { mode } => match mode.as_str() {
            "round" => json!({"cmd": "set-shape", "shape": "round"}),
            "rect" | "rectangular" => json!({"cmd": "set-shape", "shape": "rectangular"}),
            "toggle" => json!({"cmd": "toggle-shape"}),
            other => anyhow::bail!("Unknown shape mode: {}. Use round, rectangular, or toggle", other),
        },
        Commands::Reload => json!({"cmd": "reload-config"}),
        Commands::State => json!({"cmd": "get-state"}),
        Commands::Quit => json!({"cmd": "quit"}),
    };

    let resp = send_command(&sock, cmd)?;

    if let Some(true) = resp.get("ok").and_then(|v| v.as_bool()) {
        if matches!(&cli.command, Commands::State) {
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
    } else {
        let err = resp.get("error").and_then(|v| v.as_str()).unwrap_or("Unknown error");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    Ok(())
}
