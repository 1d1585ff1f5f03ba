//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An authenticated person and their accumulated progress
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Stable identifier supplied by the external identity provider
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub profile_image_ref: Option<String>,
    pub current_streak: i64,
    /// Lifetime count of completed activities
    pub total_activities: i64,
    pub total_points: i64,
    /// Always derived from total_points, never set directly
    pub level: i64,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// A user-defined task that can be completed for points
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub category: String,
    pub priority: i64,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    /// Set exactly when the activity transitions to completed
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Create activity request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateActivityRequest {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<i64>,
    pub points: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CreateActivityRequest {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            description: None,
            category: None,
            priority: None,
            points: None,
            due_date: None,
            address: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn points(mut self, points: i64) -> Self {
        self.points = Some(points);
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Records that a user has satisfied a badge condition.
/// At most one row exists per (user_id, badge_id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BadgeUnlock {
    pub user_id: String,
    pub badge_id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: DateTime<Utc>,
    pub is_visible: bool,
}

/// Category tag for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Achievement,
    System,
    Security,
    Reminder,
    Marketing,
}

/// A user-facing message describing an event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub action_text: Option<String>,
    /// Opaque JSON payload for the call-to-action
    pub action_data: Option<String>,
    pub priority: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Create notification request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub action_text: Option<String>,
    pub action_data: Option<String>,
    pub priority: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateNotificationRequest {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            action_text: None,
            action_data: None,
            priority: 0,
            expires_at: None,
        }
    }

    pub fn action_text(mut self, text: impl Into<String>) -> Self {
        self.action_text = Some(text.into());
        self
    }

    pub fn action_data(mut self, data: impl Into<String>) -> Self {
        self.action_data = Some(data.into());
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }
}

/// New user totals applied atomically with an activity completion
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub total_points: i64,
    pub total_activities: i64,
    pub level: i64,
    pub current_streak: i64,
    pub last_active: DateTime<Utc>,
}
