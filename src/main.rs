use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ymusic_shell::cli::{App, Cli, Commands, ShellCommands};
use ymusic_shell::shell::window::WindowBounds;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let app = App::new()?;

    match cli.command {
        Commands::Send { command } => {
            app.send(command)?;
        }
        Commands::Seek { position } => {
            app.seek(&position)?;
        }
        Commands::Navigate { url } => {
            app.navigate(&url)?;
        }
        Commands::PlayTrack { index } => {
            app.play_track(index)?;
        }
        Commands::Open { url } => {
            app.open(&url)?;
        }
        Commands::Press { accelerator } => {
            app.press(&accelerator)?;
        }
        Commands::Navigated { can_go_back } => {
            app.navigated(can_go_back)?;
        }
        Commands::Window {
            width,
            height,
            x,
            y,
            full_screen,
        } => {
            app.window(
                WindowBounds {
                    x,
                    y,
                    width,
                    height,
                },
                full_screen,
            )?;
        }
        Commands::Close => {
            app.close()?;
        }
        Commands::Reload => {
            app.reload()?;
        }
        Commands::Suspend => {
            app.suspend()?;
        }
        Commands::Status => {
            app.status()?;
        }
        Commands::Keys => {
            app.keys()?;
        }
        Commands::Hotkeys => {
            app.hotkeys()?;
        }
        Commands::Shell { command } => match command {
            ShellCommands::Start => {
                app.shell_start()?;
            }
            ShellCommands::Stop => {
                app.shell_stop()?;
            }
            ShellCommands::Status => {
                app.shell_status()?;
            }
            ShellCommands::Run => {
                app.shell_run()?;
            }
        },
    }

    Ok(())
}
