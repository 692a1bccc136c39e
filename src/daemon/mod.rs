use anyhow::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

use crate::bridge::notify::Notification;
use crate::bridge::{Bridge, BridgeOptions, HostMessage};
use crate::config::Config;
use crate::ipc::{ShellRequest, ShellResponse};
use crate::shell::Shell;
use crate::shell::headless::{DetachedPage, LogBlocker, LogInjector, LogShortcuts};
use crate::shell::hotkeys::{self, HotkeyBinding};
use crate::shell::window::{self, CloseAction, WindowBounds};

type HeadlessShell = Shell<LogInjector, LogBlocker>;

/// What a connection handler can reach.
struct Handles {
    config: Config,
    config_path: PathBuf,
    shell: Arc<Mutex<HeadlessShell>>,
    bridge_tx: UnboundedSender<HostMessage>,
    shortcuts: LogShortcuts,
    bindings: Vec<HotkeyBinding>,
    bounds: WindowBounds,
    full_screen: bool,
    running: Arc<AtomicBool>,
}

impl Handles {
    fn new(
        config: Config,
        config_path: PathBuf,
        shell: Arc<Mutex<HeadlessShell>>,
        bridge_tx: UnboundedSender<HostMessage>,
    ) -> Self {
        let mut shortcuts = LogShortcuts::default();
        let bindings = hotkeys::register_all(&mut shortcuts, configured_bindings(&config));
        let bounds = config.window.bounds;
        Self {
            config,
            config_path,
            shell,
            bridge_tx,
            shortcuts,
            bindings,
            bounds,
            full_screen: false,
            running: Arc::new(AtomicBool::new(true)),
        }
    }
}

fn configured_bindings(config: &Config) -> Vec<HotkeyBinding> {
    hotkeys::bindings(&config.hotkeys, config.shell.trusted_accessibility)
}

pub struct Daemon {
    config: Config,
    config_path: PathBuf,
}

impl Daemon {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            config_path: Config::config_path(),
        })
    }

    pub fn run(&self) -> Result<()> {
        use interprocess::local_socket::prelude::*;
        use interprocess::local_socket::{GenericFilePath, ListenerOptions};

        let socket_path = self.config.socket_path();

        // Remove stale socket
        if socket_path.exists() {
            fs::remove_file(&socket_path)?;
        }

        let pid_path = self.config.pid_path();
        fs::write(&pid_path, std::process::id().to_string())?;

        let name = socket_path.as_os_str().to_fs_name::<GenericFilePath>()?;
        let listener = ListenerOptions::new()
            .name(name)
            .create_sync()
            .with_context(|| "Failed to create socket listener")?;

        info!("Shell started, listening on {}", socket_path.display());

        let shell = Arc::new(Mutex::new(Shell::new(LogInjector, LogBlocker::default())));

        let (bridge_tx, bridge_rx) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        // The bridge owns its state on a single thread
        let options = self.config.bridge.options();
        thread::spawn(move || run_bridge_thread(bridge_rx, notify_tx, options));

        let shell_for_page = Arc::clone(&shell);
        thread::spawn(move || run_shell_thread(notify_rx, shell_for_page));

        let mut ctx = Handles::new(
            self.config.clone(),
            self.config_path.clone(),
            shell,
            bridge_tx,
        );
        let running = Arc::clone(&ctx.running);

        info!(
            "Window {}x{}, background {}",
            ctx.bounds.width,
            ctx.bounds.height,
            window::background_color(ctx.config.window.dark)
        );

        while running.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok(conn) => {
                    if let Err(e) = handle_connection(conn, &mut ctx) {
                        error!("Connection error: {e}");
                    }
                }
                Err(e) => {
                    if running.load(Ordering::SeqCst) {
                        error!("Accept error: {e}");
                    }
                }
            }
        }

        // Closing the host channel stops the bridge, which stops the shell thread
        drop(ctx);
        let _ = fs::remove_file(&socket_path);
        let _ = fs::remove_file(&pid_path);

        info!("Shell stopped");
        Ok(())
    }

    pub fn start_detached(config: &Config) -> Result<()> {
        use std::process::Command;

        let socket_path = config.socket_path();
        if socket_path.exists() {
            let client = crate::ipc::ShellClient::new(&socket_path);
            if client.is_shell_running() {
                anyhow::bail!("Shell is already running");
            }
            fs::remove_file(&socket_path)?;
        }

        let exe = std::env::current_exe()?;

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;

            Command::new(&exe)
                .arg("shell")
                .arg("run")
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .process_group(0)
                .spawn()
                .with_context(|| "Failed to start shell")?;
        }

        #[cfg(not(unix))]
        {
            Command::new(&exe)
                .arg("shell")
                .arg("run")
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn()
                .with_context(|| "Failed to start shell")?;
        }

        for _ in 0..50 {
            if socket_path.exists() {
                return Ok(());
            }
            thread::sleep(std::time::Duration::from_millis(100));
        }

        anyhow::bail!("Shell failed to start")
    }

    pub fn stop(config: &Config) -> Result<()> {
        let client = crate::ipc::ShellClient::new(config.socket_path());
        if client.is_shell_running() {
            client.shutdown()?;
            for _ in 0..50 {
                if !config.socket_path().exists() {
                    return Ok(());
                }
                thread::sleep(std::time::Duration::from_millis(100));
            }
        }
        Ok(())
    }

    pub fn is_running(config: &Config) -> bool {
        let client = crate::ipc::ShellClient::new(config.socket_path());
        client.is_shell_running()
    }
}

fn run_bridge_thread(
    rx: UnboundedReceiver<HostMessage>,
    notify_tx: UnboundedSender<Notification>,
    options: BridgeOptions,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start bridge runtime: {e}");
            return;
        }
    };

    let bridge = Bridge::new(DetachedPage, notify_tx, options);
    runtime.block_on(bridge.run(rx));
}

fn run_shell_thread(mut rx: UnboundedReceiver<Notification>, shell: Arc<Mutex<HeadlessShell>>) {
    while let Some(notification) = rx.blocking_recv() {
        match shell.lock() {
            Ok(mut shell) => shell.handle_notification(notification),
            Err(e) => {
                error!("Shell state poisoned: {e}");
                break;
            }
        }
    }
}

fn handle_connection(conn: interprocess::local_socket::Stream, ctx: &mut Handles) -> Result<()> {
    let mut reader = BufReader::new(&conn);
    let mut writer = &conn;

    let mut line = String::new();
    reader.read_line(&mut line)?;

    let request: ShellRequest = serde_json::from_str(&line)?;
    let response = handle_request(request, ctx);

    let response_json = serde_json::to_string(&response)?;
    writeln!(writer, "{response_json}")?;
    writer.flush()?;

    Ok(())
}

fn handle_request(request: ShellRequest, ctx: &mut Handles) -> ShellResponse {
    match request {
        ShellRequest::Player { command } => forward(ctx, HostMessage::Command(command)),
        ShellRequest::Navigated { can_go_back } => {
            forward(ctx, HostMessage::Navigated { can_go_back })
        }
        ShellRequest::Hotkey { accelerator } => {
            let Some(binding) = ctx.bindings.iter().find(|b| b.accelerator == accelerator) else {
                return ShellResponse::Error(format!("No hotkey bound to {accelerator}"));
            };
            let (command, notice) = match ctx.shell.lock() {
                Ok(shell) => shell.hotkey_pressed(binding),
                Err(e) => return ShellResponse::Error(e.to_string()),
            };
            if let Some(notice) = notice {
                info!("Notice: {}", notice.text());
            }
            match command {
                Some(command) => forward(ctx, HostMessage::Command(command)),
                None => ShellResponse::Ok,
            }
        }
        ShellRequest::Window {
            bounds,
            full_screen,
        } => {
            ctx.bounds = bounds;
            ctx.full_screen = full_screen;
            ShellResponse::Ok
        }
        ShellRequest::Close => {
            if let CloseAction::Hide { leave_full_screen } =
                window::on_close_requested(false, ctx.full_screen, ctx.bounds)
            {
                if leave_full_screen {
                    ctx.full_screen = false;
                    info!("Leaving full screen before hiding");
                }
                info!("Window hidden, still running in the background");
            }
            ShellResponse::Ok
        }
        ShellRequest::ReloadConfig => match Config::load_from(&ctx.config_path) {
            Ok(config) => {
                ctx.bindings = hotkeys::reload(&mut ctx.shortcuts, configured_bindings(&config));
                ctx.config = config;
                ShellResponse::Ok
            }
            Err(e) => ShellResponse::Error(format!("{e:#}")),
        },
        ShellRequest::Suspend => {
            let command = match ctx.shell.lock() {
                Ok(mut shell) => shell.suspend(),
                Err(e) => return ShellResponse::Error(e.to_string()),
            };
            forward(ctx, HostMessage::Command(command))
        }
        ShellRequest::GetStatus => match ctx.shell.lock() {
            Ok(shell) => ShellResponse::Status(shell.status().clone()),
            Err(e) => ShellResponse::Error(e.to_string()),
        },
        ShellRequest::Shutdown => {
            persist_bounds(ctx);
            ctx.running.store(false, Ordering::SeqCst);
            ShellResponse::Ok
        }
    }
}

/// Keeps the window geometry for the next start, as a quitting window would.
fn persist_bounds(ctx: &mut Handles) {
    let CloseAction::Close {
        persist: Some(bounds),
    } = window::on_close_requested(true, ctx.full_screen, ctx.bounds)
    else {
        return;
    };
    if !ctx.config.remember_window_bounds(bounds) {
        return;
    }
    match ctx.config.save_to(&ctx.config_path) {
        Ok(()) => info!("Saved window bounds {}x{}", bounds.width, bounds.height),
        Err(e) => error!("Failed to save window bounds: {e:#}"),
    }
}

fn forward(ctx: &Handles, message: HostMessage) -> ShellResponse {
    if ctx.bridge_tx.send(message).is_ok() {
        ShellResponse::Ok
    } else {
        warn!("Bridge is not running");
        ShellResponse::Error("Bridge is not running".to_string())
    }
}
