//! Notification dispatch service
//!
//! Materializes notification records and provides canned content for
//! well-known event categories (welcome, level-up, badge unlocks,
//! streak milestones, security alerts, inactivity reminders).
//!
//! This layer never deduplicates: duplicate suppression is the caller's
//! responsibility (the progress engine's idempotent initialize/award
//! checks).

use crate::config;
use crate::database::{CreateNotificationRequest, Notification, NotificationType, Repository};
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Service for creating and querying notifications
#[derive(Clone)]
pub struct NotificationDispatch {
    repo: Repository,
}

impl NotificationDispatch {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Insert a notification record with a fresh id and timestamp.
    pub async fn create(&self, req: CreateNotificationRequest) -> Result<Notification> {
        self.repo.insert_notification(req).await
    }

    // ===== Canned content =====

    pub async fn send_welcome(&self, user_id: &str) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Achievement,
                "🎉 Welcome to 24+1!",
                "Start your productivity journey today! Explore activities and build your daily streak.",
            )
            .action_text("Get Started"),
        )
        .await
    }

    /// Onboarding nudge sent once alongside the welcome message.
    pub async fn send_onboarding(&self, user_id: &str) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Marketing,
                "🏆 Collect Badges",
                "Complete activities and achieve milestones to unlock special badges!",
            )
            .action_text("View Badges"),
        )
        .await
    }

    pub async fn send_badge_unlocked(
        &self,
        user_id: &str,
        badge_name: &str,
        badge_icon: &str,
    ) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Achievement,
                "🏆 New Badge Unlocked!",
                format!(
                    "Congratulations! You've earned the '{}' badge {}",
                    badge_name, badge_icon
                ),
            )
            .action_text("View Badges")
            .action_data(serde_json::json!({ "badge": badge_name }).to_string()),
        )
        .await
    }

    pub async fn send_level_up(&self, user_id: &str, new_level: i64) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Achievement,
                "🆙 Level Up!",
                format!("Congratulations! You've reached Level {}!", new_level),
            )
            .action_text("View Profile")
            .action_data(serde_json::json!({ "level": new_level }).to_string()),
        )
        .await
    }

    pub async fn send_activity_completed(
        &self,
        user_id: &str,
        activity_title: &str,
        points_earned: i64,
    ) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Achievement,
                "✅ Activity Completed!",
                format!(
                    "Great job completing '{}'! You earned {} points.",
                    activity_title, points_earned
                ),
            )
            .action_text("View Progress"),
        )
        .await
    }

    pub async fn send_perfect_day(&self, user_id: &str) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Achievement,
                "⭐ Perfect Day!",
                "Congratulations! You've completed all your activities for today!",
            )
            .action_text("View Stats"),
        )
        .await
    }

    /// Streak announcements fire only at 7 days, 30 days, or any
    /// multiple of 10 days. Other lengths return Ok(None).
    pub async fn send_streak_milestone(
        &self,
        user_id: &str,
        streak_days: i64,
    ) -> Result<Option<Notification>> {
        let (title, message) = if streak_days == config::STREAK_WEEK_MILESTONE {
            (
                "🔥 Week Streak!".to_string(),
                "Amazing! You've maintained a 7-day streak!".to_string(),
            )
        } else if streak_days == config::STREAK_MONTH_MILESTONE {
            (
                "🔥 Month Streak!".to_string(),
                "Incredible! You've maintained a 30-day streak!".to_string(),
            )
        } else if streak_days > 0 && streak_days % config::STREAK_MILESTONE_INTERVAL == 0 {
            (
                format!("🔥 {}-Day Streak!", streak_days),
                format!(
                    "Outstanding! You've maintained a {}-day streak!",
                    streak_days
                ),
            )
        } else {
            return Ok(None);
        };

        let notification = self
            .create(
                CreateNotificationRequest::new(
                    user_id,
                    NotificationType::Achievement,
                    title,
                    message,
                )
                .action_text("View Profile"),
            )
            .await?;

        Ok(Some(notification))
    }

    pub async fn send_daily_reminder(&self, user_id: &str) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Reminder,
                "📅 Daily Check-in",
                "Don't forget your daily activities! Keep your streak alive.",
            )
            .action_text("View Activities"),
        )
        .await
    }

    pub async fn send_security_alert(
        &self,
        user_id: &str,
        device_info: &str,
    ) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Security,
                "🔐 New Login Detected",
                format!(
                    "We detected a login from: {}. If this wasn't you, please check your account security.",
                    device_info
                ),
            )
            .action_text("Review Security"),
        )
        .await
    }

    pub async fn send_app_update(&self, user_id: &str, version: &str) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::System,
                "📱 App Updated",
                format!(
                    "24+1 has been updated to version {} with new features and improvements.",
                    version
                ),
            )
            .action_text("What's New"),
        )
        .await
    }

    pub async fn send_feature_announcement(
        &self,
        user_id: &str,
        feature_name: &str,
    ) -> Result<Notification> {
        self.create(
            CreateNotificationRequest::new(
                user_id,
                NotificationType::Marketing,
                format!("🚀 New Feature: {}", feature_name),
                "Check out the latest addition to 24+1! Discover new ways to boost your productivity.",
            )
            .action_text("Try Now"),
        )
        .await
    }

    /// Sent only after at least 3 days of inactivity; shorter gaps
    /// return Ok(None).
    pub async fn send_inactivity_reminder(
        &self,
        user_id: &str,
        days_inactive: i64,
    ) -> Result<Option<Notification>> {
        if days_inactive < config::INACTIVITY_REMINDER_DAYS {
            return Ok(None);
        }

        let notification = self
            .create(
                CreateNotificationRequest::new(
                    user_id,
                    NotificationType::Reminder,
                    "👋 We miss you!",
                    format!(
                        "It's been {} days since your last activity. Come back and continue your journey!",
                        days_inactive
                    ),
                )
                .action_text("Resume"),
            )
            .await?;

        Ok(Some(notification))
    }

    // ===== Reads =====

    pub async fn list(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.repo.list_notifications(user_id).await
    }

    pub async fn list_unread(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.repo.list_unread_notifications(user_id).await
    }

    pub async fn list_by_type(
        &self,
        user_id: &str,
        kind: NotificationType,
    ) -> Result<Vec<Notification>> {
        self.repo.list_notifications_by_type(user_id, kind).await
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<i64> {
        self.repo.unread_notification_count(user_id).await
    }

    pub async fn get(&self, id: &str) -> Result<Notification> {
        self.repo.get_notification(id).await
    }

    // ===== Mutations =====

    pub async fn mark_read(&self, id: &str) -> Result<()> {
        self.repo.mark_notification_read(id).await
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        self.repo.mark_all_notifications_read(user_id).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repo.delete_notification(id).await
    }

    pub async fn delete_all(&self, user_id: &str) -> Result<u64> {
        self.repo.delete_all_notifications(user_id).await
    }

    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = self.repo.delete_expired_notifications(now).await?;
        if removed > 0 {
            tracing::info!("Swept {} expired notifications", removed);
        }
        Ok(removed)
    }
}
