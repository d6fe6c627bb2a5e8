//! Quick commands answered on the machine instead of by the AI service.

use std::sync::Arc;

use sysinfo::System;
use tracing::{info, warn};

use crate::assistant::types::QueryError;
use crate::monitor::used_memory_percent;

/// Opens a URL in the user's browser.
pub type UrlOpener = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// The default [`UrlOpener`], backed by the `open` crate.
pub fn system_opener() -> UrlOpener {
    Arc::new(|url: &str| open::that(url))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    /// `ram usage` / `check ram`
    RamUsage,
    /// `cpu usage` / `check cpu`
    CpuUsage,
    /// `search <terms>`
    WebSearch(String),
}

impl LocalCommand {
    /// Recognise a quick command. Matching is case-insensitive.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let lowered = trimmed.to_lowercase();
        match lowered.as_str() {
            "ram usage" | "check ram" => return Some(Self::RamUsage),
            "cpu usage" | "check cpu" => return Some(Self::CpuUsage),
            _ => {}
        }
        if lowered.starts_with("search ")
            && let Some(rest) = trimmed.get("search ".len()..)
        {
            let terms = rest.trim();
            if !terms.is_empty() {
                return Some(Self::WebSearch(terms.to_owned()));
            }
        }
        None
    }

    /// Run the command and produce the reply text.
    pub async fn execute(&self, opener: &UrlOpener) -> Result<String, QueryError> {
        match self {
            Self::RamUsage => {
                let percent = blocking(ram_percent).await?;
                Ok(format!("RAM Usage: {percent:.1}%"))
            }
            Self::CpuUsage => {
                let percent = blocking(cpu_percent).await?;
                Ok(format!("CPU Usage: {percent:.1}%"))
            }
            Self::WebSearch(terms) => {
                let url = search_url(terms);
                info!(%url, "opening web search");
                let opener = Arc::clone(opener);
                let target = url.clone();
                blocking(move || opener(&target))
                    .await?
                    .map_err(|e| {
                        warn!("cannot open browser: {e}");
                        QueryError::Other(format!("cannot open browser: {e}"))
                    })?;
                Ok(format!("Searching Google for: {terms}"))
            }
        }
    }
}

/// Google search URL for `terms`.
pub fn search_url(terms: &str) -> String {
    format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(terms)
    )
}

async fn blocking<T, F>(f: F) -> Result<T, QueryError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| QueryError::Other(format!("local command failed: {e}")))
}

fn ram_percent() -> f64 {
    let mut system = System::new();
    system.refresh_memory();
    used_memory_percent(&system)
}

fn cpu_percent() -> f32 {
    let mut system = System::new();
    system.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu_usage();
    system.global_cpu_usage()
}
