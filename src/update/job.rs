//! Update run with user-facing reporting.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::notify::Notifier;
use crate::scheduler::RecurringJob;
use crate::ui::{Poster, UiEvent, View};
use crate::update::{UpdateOutcome, UpdateTrigger, Updater};

/// Runs the [`Updater`], notifies the user, and posts start/finish events.
///
/// Failures never propagate: they become a notification and an
/// [`UpdateOutcome::Failed`]. A panicking updater is reported the same way.
pub struct UpdateJob<V: View> {
    updater: Arc<dyn Updater>,
    notifier: Arc<dyn Notifier>,
    poster: Poster<V>,
}

impl<V: View> Clone for UpdateJob<V> {
    fn clone(&self) -> Self {
        Self {
            updater: Arc::clone(&self.updater),
            notifier: Arc::clone(&self.notifier),
            poster: self.poster.clone(),
        }
    }
}

impl<V: View> UpdateJob<V> {
    pub fn new(updater: Arc<dyn Updater>, notifier: Arc<dyn Notifier>, poster: Poster<V>) -> Self {
        Self {
            updater,
            notifier,
            poster,
        }
    }

    /// Run one update and report it.
    pub async fn execute(&self, trigger: UpdateTrigger) -> UpdateOutcome {
        info!(%trigger, "system update starting");
        self.notifier
            .notify("System Update", &format!("{trigger} system update started..."));
        self.poster.emit(UiEvent::UpdateStarted { trigger });

        let result = match AssertUnwindSafe(self.updater.run_update())
            .catch_unwind()
            .await
        {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => {
                error!(%trigger, "updater panicked");
                Err("updater panicked".to_owned())
            }
        };

        let outcome = match result {
            Ok(report) => {
                self.notifier.notify(
                    "Update Complete",
                    "System has been successfully updated!",
                );
                UpdateOutcome::Completed {
                    summary: report.summary(),
                }
            }
            Err(reason) => {
                warn!(%trigger, "system update failed: {reason}");
                self.notifier
                    .notify("Update Failed", &format!("Error during update: {reason}"));
                UpdateOutcome::Failed { reason }
            }
        };

        self.poster.emit(UiEvent::UpdateFinished {
            trigger,
            outcome: outcome.clone(),
        });
        outcome
    }
}

#[async_trait]
impl<V: View> RecurringJob for UpdateJob<V> {
    async fn run(&self) {
        self.execute(UpdateTrigger::Scheduled).await;
    }
}
