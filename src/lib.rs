//! Nexus: desktop tray assistant core.
//!
//! Background workers feed one UI-owning thread:
//!
//! # Architecture
//!
//! - **Scheduler**: a cancelable daily job that runs the system update at
//!   local midnight and every 24 hours after
//! - **Clipboard watcher**: polls clipboard text into a bounded,
//!   deduplicated history
//! - **Query dispatcher**: one tokio task per AI query, with retry/backoff on
//!   rate limiting and exactly one posted result per query
//! - **System monitor**: samples RAM usage for the status line
//!
//! Workers never touch UI state. They hold a [`ui::Poster`] and post
//! callbacks that the [`ui::EventLoop`] runs on the UI thread.

pub mod app;
pub mod assistant;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod nexus_dirs;
pub mod notify;
pub mod scheduler;
pub mod ui;
pub mod update;


pub use app::{Collaborators, Nexus};
pub use config::NexusConfig;
pub use error::{NexusError, Result};
pub use ui::{EventLoop, Poster, UiEvent, UiState, View, ui_channel};
