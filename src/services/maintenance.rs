//! Maintenance service
//!
//! Background task that sweeps expired notifications and nudges
//! inactive users. Runs once per day; errors are logged and never
//! crash the loop.

use crate::config;
use crate::database::Repository;
use crate::error::Result;
use crate::services::notifications::NotificationDispatch;
use chrono::Utc;

/// Periodic maintenance over the notification and user tables
#[derive(Clone)]
pub struct MaintenanceService {
    repo: Repository,
    dispatch: NotificationDispatch,
}

impl MaintenanceService {
    pub fn new(repo: Repository, dispatch: NotificationDispatch) -> Self {
        Self { repo, dispatch }
    }

    /// Start the background sweep loop.
    pub fn start(self) {
        tokio::spawn(async move {
            tracing::info!("Starting maintenance scheduler");

            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                config::MAINTENANCE_INTERVAL_SECS,
            ));

            loop {
                interval.tick().await;

                if let Err(e) = self.run_sweep().await {
                    tracing::error!("Maintenance sweep failed: {}", e);
                }
            }
        });
    }

    /// One maintenance pass: drop expired notifications, then remind
    /// users who have been away for a while.
    pub async fn run_sweep(&self) -> Result<()> {
        let now = Utc::now();

        self.dispatch.sweep_expired(now).await?;

        for user in self.repo.list_users().await? {
            let days_inactive = (now - user.last_active).num_days();
            if days_inactive < config::INACTIVITY_REMINDER_DAYS {
                continue;
            }

            // A failed reminder should not block the rest of the sweep
            if let Err(e) = self
                .dispatch
                .send_inactivity_reminder(&user.user_id, days_inactive)
                .await
            {
                tracing::error!(
                    "Inactivity reminder failed for user {}: {}",
                    user.user_id,
                    e
                );
            }
        }

        Ok(())
    }
}
