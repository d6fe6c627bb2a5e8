//! Fire-and-forget user notifications.

use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

/// Desktop notification collaborator. Never blocks, never fails loudly.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}

/// Shows notifications with `notify-send`.
///
/// The child is reaped on a detached thread so callers on the UI thread or a
/// runtime worker never wait on it.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
    program: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("Nexus")
    }
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            program: "notify-send".to_owned(),
        }
    }

    /// Use a different notification program with the same arguments.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, title: &str, body: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(format!("--app-name={}", self.app_name))
            .arg(title)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        debug!(title, "sending desktop notification");
        let mut command = self.command(title, body);
        let spawned = std::thread::Builder::new()
            .name("nexus-notify".to_owned())
            .spawn(move || match command.status() {
                Ok(status) if !status.success() => {
                    warn!(%status, "notification program exited unsuccessfully");
                }
                Ok(_) => {}
                Err(e) => warn!("cannot run notification program: {e}"),
            });
        if let Err(e) = spawned {
            warn!("cannot spawn notification thread: {e}");
        }
    }
}
