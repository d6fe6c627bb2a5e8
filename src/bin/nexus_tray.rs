//! Headless tray host.
//!
//! Reads commands from stdin and renders UI-state changes to stdout. The
//! main thread owns the UI state and runs the event loop; stdin is read on a
//! separate thread that posts each line to it.
//!
//! Commands: `/update`, `/update-in [secs]`, `/auto on|off`, `/history`,
//! `/clear`, `/copy <n>`, `/paste`, `/clean`, `/send`, `/capacity <n>`,
//! `/status`, `/help`, `/quit`. Any other line is sent to the assistant.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use nexus::clipboard::history::menu_label;
use nexus::notify::LogNotifier;
use nexus::{Collaborators, Nexus, NexusConfig, Poster, UiEvent, UiState, View, ui_channel};

#[derive(Debug, Parser)]
#[command(name = "nexus-tray", version, about = "Tray assistant host driven from stdin")]
struct Cli {
    /// Config file (defaults to ~/.config/nexus/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not arm the daily update at startup.
    #[arg(long)]
    no_auto_update: bool,

    /// Log notifications instead of showing desktop popups.
    #[arg(long)]
    log_notifications: bool,

    /// Log to stderr only.
    #[arg(long)]
    no_log_file: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Update,
    UpdateIn(Option<u64>),
    Auto(bool),
    History,
    Clear,
    Copy(usize),
    Paste,
    Clean,
    Send,
    Capacity(usize),
    Status,
    Help,
    Quit,
    Query(String),
    Empty,
    Invalid(String),
}

impl ShellCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('/') {
            return Self::Query(line.to_owned());
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let arg = parts.next();
        match (command, arg) {
            ("/update", None) => Self::Update,
            ("/update-in", None) => Self::UpdateIn(None),
            ("/update-in", Some(secs)) => match secs.parse() {
                Ok(secs) => Self::UpdateIn(Some(secs)),
                Err(_) => Self::Invalid(format!("not a number of seconds: {secs}")),
            },
            ("/auto", Some("on")) => Self::Auto(true),
            ("/auto", Some("off")) => Self::Auto(false),
            ("/auto", _) => Self::Invalid("usage: /auto on|off".to_owned()),
            ("/history", None) => Self::History,
            ("/clear", None) => Self::Clear,
            ("/copy", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Copy(n),
                _ => Self::Invalid(format!("not a history entry: {n}")),
            },
            ("/paste", None) => Self::Paste,
            ("/clean", None) => Self::Clean,
            ("/send", None) => Self::Send,
            ("/capacity", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Capacity(n),
                _ => Self::Invalid(format!("not a capacity: {n}")),
            },
            ("/status", None) => Self::Status,
            ("/help", None) => Self::Help,
            ("/quit", None) => Self::Quit,
            _ => Self::Invalid(format!("unknown command: {line} (try /help)")),
        }
    }
}

const HELP: &str = "\
/update           run a system update now
/update-in [secs] run a system update after a delay
/auto on|off      toggle the daily update at midnight
/history          list clipboard history
/clear            clear clipboard history
/copy <n>         copy history entry n back to the clipboard
/paste            load the clipboard into the input line
/clean            show a cleaned-up copy of the clipboard text
/send             send the input line to the assistant
/capacity <n>     change how many clipboard entries are kept
/status           show auto-update and query status
/quit             exit
anything else     ask the assistant";

/// UI-thread state: the view model plus the orchestrator.
struct Shell {
    view: UiState,
    app: Nexus<Shell>,
    poster: Poster<Shell>,
    printed_lines: usize,
    stopping: bool,
}

impl Shell {
    fn handle_line(&mut self, line: &str) {
        match ShellCommand::parse(line) {
            ShellCommand::Update => self.app.update_now(),
            ShellCommand::UpdateIn(Some(secs)) => self.app.update_after(Duration::from_secs(secs)),
            ShellCommand::UpdateIn(None) => self.app.update_after_default_delay(),
            ShellCommand::Auto(enabled) => self.app.set_auto_update(enabled),
            ShellCommand::History => self.print_history(),
            ShellCommand::Clear => {
                if !self.app.clear_clipboard_history() {
                    println!("clipboard watcher is not running");
                }
            }
            ShellCommand::Copy(n) => match self.view.clipboard_history.get(n - 1) {
                Some(entry) => self.app.copy_to_clipboard(entry.clone()),
                None => println!("no history entry {n}"),
            },
            ShellCommand::Paste => self.app.paste_clipped_data(),
            ShellCommand::Clean => self.app.clean_clipped_data(),
            ShellCommand::Send => {
                let text = std::mem::take(&mut self.view.input_line);
                if self.app.submit(&text).is_none() {
                    println!("input line is empty");
                }
            }
            ShellCommand::Capacity(n) => {
                if !self.app.set_history_capacity(n) {
                    println!("clipboard watcher is not running");
                }
            }
            ShellCommand::Status => self.print_status(),
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => self.quit(),
            ShellCommand::Query(text) => {
                self.app.submit(&text);
            }
            ShellCommand::Empty => {}
            ShellCommand::Invalid(message) => println!("{message}"),
        }
    }

    fn quit(&mut self) {
        if self.stopping {
            return;
        }
        self.stopping = true;
        self.app.shutdown();
        self.poster.request_shutdown();
    }

    fn print_history(&self) {
        if self.view.clipboard_history.is_empty() {
            println!("clipboard history is empty");
            return;
        }
        for (i, entry) in self.view.clipboard_history.iter().enumerate().rev() {
            println!("{:>3}. {}", i + 1, menu_label(entry));
        }
    }

    fn print_status(&self) {
        match self.view.next_update_at {
            Some(at) if self.view.auto_update => {
                println!("auto update: on, next at {}", at.format("%Y-%m-%d %H:%M"));
            }
            _ => println!("auto update: off"),
        }
        println!("queries in flight: {}", self.view.busy());
        println!("clipboard entries: {}", self.view.clipboard_history.len());
        println!("{}", self.view.ram_label());
    }

    fn flush_transcript(&mut self) {
        for line in &self.view.transcript[self.printed_lines..] {
            println!("{}", line.render());
        }
        self.printed_lines = self.view.transcript.len();
    }
}

impl View for Shell {
    fn apply(&mut self, event: UiEvent) {
        match &event {
            UiEvent::ClipboardHistoryChanged(snapshot) => {
                println!("[clipboard] {} entr(ies) in history", snapshot.len());
            }
            UiEvent::AutoUpdateChanged {
                enabled: true,
                next_fire_at: Some(at),
            } => println!("[auto update] next update at {}", at.format("%Y-%m-%d %H:%M")),
            UiEvent::AutoUpdateChanged { enabled: false, .. } => {
                println!("[auto update] off");
            }
            UiEvent::PasteText(text) => println!("[input] {}", menu_label(text)),
            _ => {}
        }
        let was_busy = self.view.is_busy();
        self.view.apply(event);
        self.flush_transcript();
        if was_busy && !self.view.is_busy() {
            println!("[ready]");
        }
    }
}

fn spawn_stdin_reader(poster: Poster<Shell>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("nexus-stdin".to_owned())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => poster.post(move |shell: &mut Shell| shell.handle_line(&line)),
                    Err(e) => {
                        tracing::warn!("stdin read failed: {e}");
                        break;
                    }
                }
                if poster.is_closed() {
                    return;
                }
            }
            poster.post(|shell: &mut Shell| shell.quit());
        })
        .map(|_| ())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_dir = (!cli.no_log_file).then(nexus::nexus_dirs::logs_dir);
    let _log_guard = nexus::logging::init(log_dir.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => NexusConfig::from_file(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => NexusConfig::load_or_default(),
    };
    if cli.no_auto_update {
        config.auto_update.enabled_at_start = false;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("nexus-worker")
        .build()
        .context("cannot build tokio runtime")?;

    let mut collaborators = Collaborators::production(&config)?;
    if cli.log_notifications {
        collaborators.notifier = Arc::new(LogNotifier);
    }

    let (poster, event_loop) = ui_channel::<Shell>();
    let mut app = Nexus::new(config, collaborators, poster.clone(), runtime.handle().clone());
    app.start();
    spawn_stdin_reader(poster.clone()).context("cannot spawn stdin reader")?;

    tracing::info!("nexus-tray ready");
    println!("Nexus ready. Type /help for commands.");

    let mut shell = Shell {
        view: UiState::new(),
        app,
        poster,
        printed_lines: 0,
        stopping: false,
    };
    event_loop.run(&mut shell);
    shell.quit();

    runtime.shutdown_timeout(Duration::from_secs(2));
    tracing::info!("nexus-tray shut down cleanly");
    Ok(())
}
