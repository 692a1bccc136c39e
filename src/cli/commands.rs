use anyhow::{Context, Result, bail};

use crate::bridge::command::Command;
use crate::config::Config;
use crate::daemon::Daemon;
use crate::ipc::{ShellClient, ShellResponse};
use crate::models::{PlayerStatus, format_seconds};
use crate::shell::hotkeys;
use crate::shell::window::{WindowBounds, deep_link_target};

pub struct App {
    pub config: Config,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        config.ensure_dirs()?;

        Ok(Self { config })
    }

    fn client(&self) -> ShellClient {
        ShellClient::new(self.config.socket_path())
    }

    fn ensure_shell(&self) -> Result<ShellClient> {
        let client = self.client();
        if !client.is_shell_running() {
            if self.config.shell.auto_start {
                println!("Starting shell...");
                Daemon::start_detached(&self.config)?;
            } else {
                bail!("Shell is not running. Start it with: ymusic shell start");
            }
        }
        Ok(client)
    }

    fn player(&self, command: Command) -> Result<()> {
        let client = self.ensure_shell()?;
        expect_ok(client.player(command.clone())?)
            .with_context(|| format!("Failed to send {command}"))
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.player(command.clone())?;
        println!("Sent {command}");
        Ok(())
    }

    pub fn seek(&self, position: &str) -> Result<()> {
        let seconds = parse_time(position)?;
        self.player(Command::SetPosition(seconds))?;
        println!("Seeked to {}", format_seconds(seconds));
        Ok(())
    }

    pub fn navigate(&self, url: &str) -> Result<()> {
        self.player(Command::Navigate(url.to_string()))?;
        println!("Navigating to {url}");
        Ok(())
    }

    pub fn play_track(&self, index: usize) -> Result<()> {
        self.player(Command::PlayTrack(index))?;
        println!("Playing track #{index}");
        Ok(())
    }

    pub fn open(&self, url: &str) -> Result<()> {
        let target = deep_link_target(url, &self.config.shell.home_url);
        self.player(Command::Navigate(target.clone()))?;
        println!("Opening {target}");
        Ok(())
    }

    pub fn press(&self, accelerator: &str) -> Result<()> {
        let client = self.ensure_shell()?;
        expect_ok(client.hotkey(accelerator)?)
    }

    pub fn navigated(&self, can_go_back: bool) -> Result<()> {
        let client = self.ensure_shell()?;
        expect_ok(client.navigated(can_go_back)?)
    }

    pub fn window(&self, bounds: WindowBounds, full_screen: bool) -> Result<()> {
        let client = self.ensure_shell()?;
        expect_ok(client.window(bounds, full_screen)?)
    }

    pub fn close(&self) -> Result<()> {
        let client = self.ensure_shell()?;
        expect_ok(client.close()?)
    }

    pub fn reload(&self) -> Result<()> {
        let client = self.client();
        if !client.is_shell_running() {
            println!("Shell is not running.");
            return Ok(());
        }
        expect_ok(client.reload_config()?)?;
        println!("Config reloaded");
        Ok(())
    }

    pub fn suspend(&self) -> Result<()> {
        let client = self.client();
        if !client.is_shell_running() {
            println!("Shell is not running.");
            return Ok(());
        }
        expect_ok(client.suspend()?)?;
        println!("Paused for suspend");
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        let client = self.client();

        if !client.is_shell_running() {
            println!("Shell is not running.");
            return Ok(());
        }

        let status = client.get_status()?;
        print_status(&status);
        Ok(())
    }

    pub fn keys(&self) -> Result<()> {
        println!("{:<16} KEY", "COMMAND");
        for command in Command::SIMPLE {
            let key = command
                .fallback_key()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{:<16} {key}", command.name());
        }
        Ok(())
    }

    pub fn hotkeys(&self) -> Result<()> {
        let bindings = hotkeys::bindings(
            &self.config.hotkeys,
            self.config.shell.trusted_accessibility,
        );
        for binding in bindings {
            let action = binding
                .command
                .map(|c| c.to_string())
                .unwrap_or_else(|| "trackInfo".to_string());
            println!("{:<24} {action}", binding.accelerator);
        }
        Ok(())
    }

    pub fn shell_start(&self) -> Result<()> {
        if Daemon::is_running(&self.config) {
            println!("Shell is already running.");
            return Ok(());
        }

        Daemon::start_detached(&self.config)?;
        println!("Shell started.");
        Ok(())
    }

    pub fn shell_stop(&self) -> Result<()> {
        if !Daemon::is_running(&self.config) {
            println!("Shell is not running.");
            return Ok(());
        }

        Daemon::stop(&self.config)?;
        println!("Shell stopped.");
        Ok(())
    }

    pub fn shell_status(&self) -> Result<()> {
        if Daemon::is_running(&self.config) {
            println!("Shell is running.");
            self.status()?;
        } else {
            println!("Shell is not running.");
        }
        Ok(())
    }

    pub fn shell_run(&self) -> Result<()> {
        let daemon = Daemon::new(self.config.clone())?;
        daemon.run()
    }
}

fn expect_ok(response: ShellResponse) -> Result<()> {
    match response {
        ShellResponse::Ok => Ok(()),
        ShellResponse::Error(e) => bail!("{e}"),
        ShellResponse::Status(_) => bail!("Unexpected response"),
    }
}

pub fn parse_time(s: &str) -> Result<f64> {
    let seconds = if let Some((mins, secs)) = s.split_once(':') {
        let mins: u64 = mins.trim().parse().context("Invalid minutes")?;
        let secs: f64 = secs.trim().parse().context("Invalid seconds")?;
        mins as f64 * 60.0 + secs
    } else {
        s.trim()
            .parse()
            .context("Invalid time format. Use seconds or MM:SS")?
    };

    if !seconds.is_finite() || seconds < 0.0 {
        bail!("Invalid time: {s}");
    }
    Ok(seconds)
}

fn print_status(status: &PlayerStatus) {
    if !status.ready {
        println!("Player is loading");
        return;
    }

    println!("{}", status.summary());
    if status.current_track.is_some() {
        println!(
            "Position: {} / {}",
            format_seconds(status.progress.position),
            format_seconds(status.progress.duration)
        );
    }
    if !status.playlist.is_empty() {
        println!("Playlist: {} tracks", status.playlist.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("90").unwrap(), 90.0);
        assert_eq!(parse_time("90.5").unwrap(), 90.5);
        assert_eq!(parse_time("1:30").unwrap(), 90.0);
        assert_eq!(parse_time("1:30.25").unwrap(), 90.25);
        assert_eq!(parse_time("0:05").unwrap(), 5.0);
        assert!(parse_time("-3").is_err());
        assert!(parse_time("inf").is_err());
        assert!(parse_time("1:xx").is_err());
        assert!(parse_time("soon").is_err());
    }

    #[test]
    fn test_expect_ok() {
        assert!(expect_ok(ShellResponse::Ok).is_ok());
        let err = expect_ok(ShellResponse::Error("Bridge is not running".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "Bridge is not running");
    }
}
