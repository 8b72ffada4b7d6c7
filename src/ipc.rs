use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum IpcCommand {
    SetShape { shape: String },
    ToggleShape,
    ReloadConfig,
    GetState,
    Quit,
}

#[derive(Debug, Serialize)]
pub struct IpcResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    // State fields (only for get-state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

impl IpcResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            shape: None,
            width: None,
            height: None,
            config_path: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(msg.into()),
            shape: None,
            width: None,
            height: None,
            config_path: None,
        }
    }

    pub fn state(shape: &str, width: u32, height: u32, config_path: &str) -> Self {
        Self {
            ok: true,
            error: None,
            shape: Some(shape.into()),
            width: Some(width),
            height: Some(height),
            config_path: Some(config_path.into()),
        }
    }
}

pub fn socket_path(override_path: Option<&PathBuf>) -> PathBuf {
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

pub fn create_listener(path: &PathBuf) -> Result<UnixListener> {
    // Remove stale socket
    if path.exists() {
        if UnixStream::connect(path).is_ok() {
            anyhow::bail!(
                "Another tickface instance is already running (socket {} is active)",
                path.display()
            );
        }
        std::fs::remove_file(path)?;
    }

    let listener = UnixListener::bind(path)?;
    listener.set_nonblocking(true)?;
    log::info!("IPC listening on {}", path.display());
    Ok(listener)
}

pub fn cleanup_socket(path: &PathBuf) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
        log::info!("Removed socket {}", path.display());
    }
}

pub fn read_command(stream: &UnixStream) -> Result<IpcCommand> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let cmd: IpcCommand = serde_json::from_str(line.trim())?;
    Ok(cmd)
}

pub fn write_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
    let json = serde_json::to_string(response)?;
    stream.write_all(json.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_deserialize_from_wire_form() {
        let cmd: IpcCommand = serde_json::from_str(r#"{"cmd": "set-shape", "shape": "round"}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::SetShape { ref shape } if shape == "round"));
        let cmd: IpcCommand = serde_json::from_str(r#"{"cmd": "toggle-shape"}"#).unwrap();
        assert!(matches!(cmd, IpcCommand::ToggleShape));
    }

    #[test]
    fn state_response_carries_only_set_fields() {
        let json = serde_json::to_string(&IpcResponse::ok()).unwrap();
        assert_eq!(json, r#"{"ok":true}"#);
        let json = serde_json::to_string(&IpcResponse::state("round", 180, 180, "/tmp/c.toml")).unwrap();
        assert!(json.contains(r#""shape":"round""#));
        assert!(!json.contains("error"));
    }
}
