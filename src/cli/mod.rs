use clap::{Parser, Subcommand};

use crate::bridge::command::Command;

mod commands;
pub use commands::*;

#[derive(Parser)]
#[command(name = "ymusic")]
#[command(about = "Desktop shell and command bridge for the Yandex Music web player")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a player command (e.g. togglePause, next, volumeUp)
    Send {
        /// Command name, see `ymusic keys`
        command: Command,
    },

    /// Seek to a position (e.g., "1:30" or "90")
    Seek {
        /// Position in seconds or MM:SS format
        position: String,
    },

    /// Navigate the player to a path inside the site
    Navigate {
        /// Site-relative path, e.g. /album/123
        url: String,
    },

    /// Play a track from the current playlist
    PlayTrack {
        /// Zero-based playlist index
        index: usize,
    },

    /// Open a yandex-music-app:// deep link
    Open {
        /// Deep link URL
        url: String,
    },

    /// Trigger a registered global hotkey
    Press {
        /// Accelerator, e.g. "Alt+P" or "MediaNextTrack"
        accelerator: String,
    },

    /// Report a page navigation so the back button can follow it
    Navigated {
        /// History has an entry to go back to
        #[arg(long)]
        can_go_back: bool,
    },

    /// Report window geometry; kept for the next start on shutdown
    Window {
        width: u32,
        height: u32,
        #[arg(long, allow_hyphen_values = true)]
        x: Option<i32>,
        #[arg(long, allow_hyphen_values = true)]
        y: Option<i32>,
        #[arg(long)]
        full_screen: bool,
    },

    /// Close the window without quitting
    Close,

    /// Re-read the config file and register hotkeys again
    Reload,

    /// Tell the shell the system is going to sleep
    Suspend,

    /// Show current player status
    Status,

    /// List player commands and their keyboard fallbacks
    Keys,

    /// List hotkey bindings from the config
    Hotkeys,

    /// Shell management
    Shell {
        #[command(subcommand)]
        command: ShellCommands,
    },
}

#[derive(Subcommand)]
pub enum ShellCommands {
    /// Start the shell
    Start,
    /// Stop the shell
    Stop,
    /// Show shell status
    Status,
    /// Run shell in foreground (internal use)
    Run,
}
