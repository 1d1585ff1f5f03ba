//! Repository layer for database operations
//!
//! This module provides CRUD and aggregate operations for all entities.
//! "Today" is always evaluated by SQLite `date()` over the stored
//! timestamps, so day boundaries are consistent across queries.

use super::models::*;
use crate::config;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Users =====

    /// Insert a user row with zero counters if none exists.
    ///
    /// Returns true when the row was actually created. Repeated calls
    /// with the same user_id are no-ops, which is what makes
    /// initialization idempotent.
    pub async fn insert_user(&self, user_id: &str, name: &str, email: &str) -> Result<bool> {
        let now = Utc::now();

        let rows = sqlx::query(
            r#"
            INSERT OR IGNORE INTO users
                (user_id, name, email, current_streak, total_activities, total_points, level, created_at, last_active)
            VALUES (?, ?, ?, 0, 0, 0, 1, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows > 0 {
            tracing::debug!("Created user: {}", user_id);
        }
        Ok(rows > 0)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn update_user_profile(
        &self,
        user_id: &str,
        name: &str,
        profile_image_ref: Option<&str>,
    ) -> Result<()> {
        let rows = sqlx::query(
            r#"
            UPDATE users SET name = ?, profile_image_ref = ?, last_active = ?
            WHERE user_id = ?
            "#,
        )
        .bind(name)
        .bind(profile_image_ref)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }

        tracing::debug!("Updated profile for user: {}", user_id);
        Ok(())
    }

    /// Delete a user. Activities and badge unlocks cascade away;
    /// notifications are kept and must be deleted separately.
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }

        tracing::debug!("Deleted user: {}", user_id);
        Ok(())
    }

    // ===== Activities =====

    pub async fn create_activity(&self, req: CreateActivityRequest) -> Result<Activity> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let activity = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities
                (id, user_id, title, description, is_completed, category, priority, points,
                 created_at, completed_at, due_date, address, latitude, longitude)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?, NULL, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.user_id)
        .bind(&req.title)
        .bind(req.description.as_deref().unwrap_or(""))
        .bind(
            req.category
                .as_deref()
                .unwrap_or(config::DEFAULT_ACTIVITY_CATEGORY),
        )
        .bind(req.priority.unwrap_or(config::DEFAULT_ACTIVITY_PRIORITY))
        .bind(req.points.unwrap_or(config::DEFAULT_ACTIVITY_POINTS))
        .bind(now)
        .bind(req.due_date)
        .bind(&req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created activity: {} for user: {}", id, req.user_id);
        Ok(activity)
    }

    pub async fn get_activity(&self, id: &str) -> Result<Activity> {
        let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ActivityNotFound(id.to_string()))?;

        Ok(activity)
    }

    pub async fn list_today_activities(&self, user_id: &str) -> Result<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE user_id = ? AND date(created_at) = date('now')
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    pub async fn list_activities_by_category(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE user_id = ? AND category = ?
            ORDER BY priority DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    pub async fn list_pending_activities(&self, user_id: &str) -> Result<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE user_id = ? AND is_completed = 0
            ORDER BY priority DESC, due_date ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    pub async fn list_completed_activities(&self, user_id: &str) -> Result<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE user_id = ? AND is_completed = 1
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    pub async fn delete_activity(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM activities WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ActivityNotFound(id.to_string()));
        }

        tracing::debug!("Deleted activity: {}", id);
        Ok(())
    }

    pub async fn completed_today_count(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activities
            WHERE user_id = ? AND is_completed = 1 AND date(completed_at) = date('now')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn total_today_count(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activities
            WHERE user_id = ? AND date(created_at) = date('now')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn completed_yesterday_count(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activities
            WHERE user_id = ? AND is_completed = 1
              AND date(completed_at) = date('now', '-1 day')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn weekly_completed_count(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activities
            WHERE user_id = ? AND is_completed = 1
              AND date(completed_at) >= date('now', '-6 days')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Apply one activity completion as a single transaction.
    ///
    /// The completed flag is flipped with a conditional update so a
    /// concurrent second tap cannot credit points twice: zero affected
    /// rows means the activity was already completed (or gone) and the
    /// transaction rolls back without touching the user row.
    pub async fn apply_completion(
        &self,
        activity_id: &str,
        user_id: &str,
        completed_at: DateTime<Utc>,
        update: &ProgressUpdate,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            UPDATE activities SET is_completed = 1, completed_at = ?
            WHERE id = ? AND user_id = ? AND is_completed = 0
            "#,
        )
        .bind(completed_at)
        .bind(activity_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::ActivityAlreadyCompleted(activity_id.to_string()));
        }

        let rows = sqlx::query(
            r#"
            UPDATE users
            SET total_points = ?, total_activities = ?, level = ?, current_streak = ?, last_active = ?
            WHERE user_id = ?
            "#,
        )
        .bind(update.total_points)
        .bind(update.total_activities)
        .bind(update.level)
        .bind(update.current_streak)
        .bind(update.last_active)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::DataIntegrity(format!(
                "activity {} references missing user {}",
                activity_id, user_id
            )));
        }

        tx.commit().await?;

        tracing::debug!("Applied completion of {} for user {}", activity_id, user_id);
        Ok(())
    }

    // ===== Badge unlocks =====

    /// Record a badge unlock if the (user, badge) pair has none yet.
    ///
    /// Returns true when the unlock was newly inserted. INSERT OR IGNORE
    /// makes awarding idempotent even across concurrent attempts.
    pub async fn insert_badge_unlock(
        &self,
        user_id: &str,
        badge_id: &str,
        name: &str,
        description: &str,
        icon: &str,
    ) -> Result<bool> {
        let rows = sqlx::query(
            r#"
            INSERT OR IGNORE INTO badge_unlocks
                (user_id, badge_id, name, description, icon, unlocked_at, is_visible)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(name)
        .bind(description)
        .bind(icon)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows > 0 {
            tracing::debug!("Unlocked badge {} for user {}", badge_id, user_id);
        }
        Ok(rows > 0)
    }

    pub async fn get_badge_unlock(
        &self,
        user_id: &str,
        badge_id: &str,
    ) -> Result<Option<BadgeUnlock>> {
        let badge = sqlx::query_as::<_, BadgeUnlock>(
            "SELECT * FROM badge_unlocks WHERE user_id = ? AND badge_id = ?",
        )
        .bind(user_id)
        .bind(badge_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(badge)
    }

    pub async fn list_badge_unlocks(&self, user_id: &str) -> Result<Vec<BadgeUnlock>> {
        let badges = sqlx::query_as::<_, BadgeUnlock>(
            "SELECT * FROM badge_unlocks WHERE user_id = ? ORDER BY unlocked_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    pub async fn set_badge_visibility(
        &self,
        user_id: &str,
        badge_id: &str,
        is_visible: bool,
    ) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE badge_unlocks SET is_visible = ? WHERE user_id = ? AND badge_id = ?",
        )
        .bind(is_visible)
        .bind(user_id)
        .bind(badge_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::Generic(format!(
                "Badge unlock not found: {}/{}",
                user_id, badge_id
            )));
        }

        Ok(())
    }

    pub async fn delete_badge_unlock(&self, user_id: &str, badge_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM badge_unlocks WHERE user_id = ? AND badge_id = ?")
            .bind(user_id)
            .bind(badge_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted badge unlock {}/{}", user_id, badge_id);
        Ok(())
    }

    // ===== Notifications =====

    pub async fn insert_notification(
        &self,
        req: CreateNotificationRequest,
    ) -> Result<Notification> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications
                (id, user_id, type, title, message, timestamp, is_read,
                 action_text, action_data, priority, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.user_id)
        .bind(req.kind)
        .bind(&req.title)
        .bind(&req.message)
        .bind(now)
        .bind(&req.action_text)
        .bind(&req.action_data)
        .bind(req.priority)
        .bind(req.expires_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created notification: {} for user: {}", id, req.user_id);
        Ok(notification)
    }

    pub async fn get_notification(&self, id: &str) -> Result<Notification> {
        let notification =
            sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotificationNotFound(id.to_string()))?;

        Ok(notification)
    }

    pub async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY timestamp DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn list_unread_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = ? AND is_read = 0
            ORDER BY timestamp DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn list_notifications_by_type(
        &self,
        user_id: &str,
        kind: NotificationType,
    ) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = ? AND type = ?
            ORDER BY timestamp DESC
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn unread_notification_count(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// One-way transition: a read notification never becomes unread again.
    pub async fn mark_notification_read(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotificationNotFound(id.to_string()));
        }

        Ok(())
    }

    pub async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64> {
        let rows = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }

    pub async fn delete_notification(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotificationNotFound(id.to_string()));
        }

        tracing::debug!("Deleted notification: {}", id);
        Ok(())
    }

    pub async fn delete_all_notifications(&self, user_id: &str) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM notifications WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted {} notifications for user {}", rows, user_id);
        Ok(rows)
    }

    pub async fn delete_expired_notifications(&self, now: DateTime<Utc>) -> Result<u64> {
        let rows =
            sqlx::query("DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < ?")
                .bind(now)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows)
    }
}
