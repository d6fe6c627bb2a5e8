//! `pkexec apt-get` update adapter.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{NexusError, Result};
use crate::update::{UpdateReport, Updater};

/// Max bytes of stderr carried into an error message.
const STDERR_TAIL_BYTES: usize = 400;

/// Runs `apt-get update`, `upgrade` and `autoremove` through `pkexec`,
/// stopping at the first failing step.
#[derive(Debug, Clone)]
pub struct PkexecAptUpdater {
    program: String,
    prefix_args: Vec<String>,
    steps: Vec<Vec<String>>,
}

impl Default for PkexecAptUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl PkexecAptUpdater {
    pub fn new() -> Self {
        let step = |args: &[&str]| args.iter().map(|a| (*a).to_owned()).collect::<Vec<_>>();
        Self {
            program: "pkexec".to_owned(),
            prefix_args: vec!["apt-get".to_owned()],
            steps: vec![
                step(&["update", "-qq"]),
                step(&["upgrade", "-y", "-qq"]),
                step(&["autoremove", "-y", "-qq"]),
            ],
        }
    }

    /// Replace the launcher and the arguments placed before each step.
    pub fn with_command(
        mut self,
        program: impl Into<String>,
        prefix_args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.program = program.into();
        self.prefix_args = prefix_args.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the step list.
    pub fn with_steps(mut self, steps: Vec<Vec<String>>) -> Self {
        self.steps = steps;
        self
    }

    async fn run_step(&self, step: &[String]) -> Result<()> {
        let label = step.join(" ");
        debug!(program = %self.program, step = %label, "running update step");
        let output = Command::new(&self.program)
            .args(&self.prefix_args)
            .args(step)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| NexusError::Updater(format!("cannot start {}: {e}", self.program)))?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = stderr_tail(stderr.trim());
        warn!(step = %label, status = %output.status, "update step failed");
        Err(NexusError::Updater(if tail.is_empty() {
            format!("`{label}` exited with {}", output.status)
        } else {
            format!("`{label}` exited with {}: {tail}", output.status)
        }))
    }
}

fn stderr_tail(stderr: &str) -> &str {
    if stderr.len() <= STDERR_TAIL_BYTES {
        return stderr;
    }
    let mut start = stderr.len() - STDERR_TAIL_BYTES;
    while !stderr.is_char_boundary(start) {
        start += 1;
    }
    &stderr[start..]
}

#[async_trait]
impl Updater for PkexecAptUpdater {
    async fn run_update(&self) -> Result<UpdateReport> {
        let started = Instant::now();
        let mut steps = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            self.run_step(step).await?;
            steps.push(step.join(" "));
        }
        let report = UpdateReport {
            steps,
            elapsed: started.elapsed(),
        };
        info!(summary = %report.summary(), "system update finished");
        Ok(report)
    }
}
