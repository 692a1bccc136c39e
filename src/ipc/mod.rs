use anyhow::{Context, Result};
use interprocess::TryClone;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::bridge::command::Command;
use crate::models::PlayerStatus;
use crate::shell::window::WindowBounds;

/// One request line sent to the running shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShellRequest {
    Player { command: Command },
    Navigated { can_go_back: bool },
    /// A global shortcut fired outside the shell, e.g. from a compositor
    /// keybinding.
    Hotkey { accelerator: String },
    /// The window layer reports new geometry.
    Window {
        bounds: WindowBounds,
        full_screen: bool,
    },
    /// Close button without quitting.
    Close,
    /// Re-read the config file and register hotkeys again.
    ReloadConfig,
    /// The system is about to sleep.
    Suspend,
    GetStatus,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShellResponse {
    Ok,
    Status(PlayerStatus),
    Error(String),
}

pub struct ShellClient {
    socket_path: std::path::PathBuf,
}

impl ShellClient {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    pub fn is_shell_running(&self) -> bool {
        self.socket_path.exists() && self.send_request(ShellRequest::GetStatus).is_ok()
    }

    pub fn send_request(&self, request: ShellRequest) -> Result<ShellResponse> {
        use interprocess::local_socket::GenericFilePath;
        use interprocess::local_socket::prelude::*;

        let path = self.socket_path.as_os_str();
        let name = path
            .to_fs_name::<GenericFilePath>()
            .with_context(|| "Invalid socket path")?;

        let conn = interprocess::local_socket::Stream::connect(name).with_context(|| {
            format!(
                "Failed to connect to shell at {}",
                self.socket_path.display()
            )
        })?;

        let mut writer = conn;
        let mut reader = BufReader::new(writer.try_clone()?);

        let msg = serde_json::to_string(&request)?;
        writeln!(writer, "{msg}")?;
        writer.flush()?;

        let mut response_line = String::new();
        reader.read_line(&mut response_line)?;

        let response: ShellResponse = serde_json::from_str(&response_line)
            .with_context(|| "Failed to parse shell response")?;

        Ok(response)
    }

    pub fn player(&self, command: Command) -> Result<ShellResponse> {
        self.send_request(ShellRequest::Player { command })
    }

    pub fn navigated(&self, can_go_back: bool) -> Result<ShellResponse> {
        self.send_request(ShellRequest::Navigated { can_go_back })
    }

    pub fn hotkey(&self, accelerator: &str) -> Result<ShellResponse> {
        self.send_request(ShellRequest::Hotkey {
            accelerator: accelerator.to_string(),
        })
    }

    pub fn window(&self, bounds: WindowBounds, full_screen: bool) -> Result<ShellResponse> {
        self.send_request(ShellRequest::Window {
            bounds,
            full_screen,
        })
    }

    pub fn close(&self) -> Result<ShellResponse> {
        self.send_request(ShellRequest::Close)
    }

    pub fn reload_config(&self) -> Result<ShellResponse> {
        self.send_request(ShellRequest::ReloadConfig)
    }

    pub fn suspend(&self) -> Result<ShellResponse> {
        self.send_request(ShellRequest::Suspend)
    }

    pub fn get_status(&self) -> Result<PlayerStatus> {
        match self.send_request(ShellRequest::GetStatus)? {
            ShellResponse::Status(status) => Ok(status),
            ShellResponse::Error(e) => anyhow::bail!("{e}"),
            _ => anyhow::bail!("Unexpected response"),
        }
    }

    pub fn shutdown(&self) -> Result<ShellResponse> {
        self.send_request(ShellRequest::Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_lines() {
        let line = serde_json::to_string(&ShellRequest::Player {
            command: Command::SetPosition(90.0),
        })
        .unwrap();
        assert_eq!(
            line,
            r#"{"Player":{"command":{"cmd":"setPosition","value":90.0}}}"#
        );

        let request: ShellRequest = serde_json::from_str(r#""Suspend""#).unwrap();
        assert!(matches!(request, ShellRequest::Suspend));
    }
}
