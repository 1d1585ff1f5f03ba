//! Application configuration constants
//!
//! Central location for all gamification rules, resource limits,
//! and validation boundaries used throughout the application.

// ===== Gamification Rules =====

/// Points required to advance one level.
/// Level is always derived as `points / POINTS_PER_LEVEL + 1`.
pub const POINTS_PER_LEVEL: i64 = 100;

/// Default point reward for a newly created activity
pub const DEFAULT_ACTIVITY_POINTS: i64 = 10;

/// Default category label for new activities
pub const DEFAULT_ACTIVITY_CATEGORY: &str = "today";

/// Default priority for new activities (medium)
pub const DEFAULT_ACTIVITY_PRIORITY: i64 = 1;

/// Completions-per-day threshold for the "good_start" badge
pub const GOOD_START_THRESHOLD: i64 = 3;

/// Completions-per-day threshold for the "productive" badge
pub const PRODUCTIVE_THRESHOLD: i64 = 5;

/// Streak length that triggers the week-milestone notification
pub const STREAK_WEEK_MILESTONE: i64 = 7;

/// Streak length that triggers the month-milestone notification
pub const STREAK_MONTH_MILESTONE: i64 = 30;

/// Beyond week/month, every multiple of this streak length is announced
pub const STREAK_MILESTONE_INTERVAL: i64 = 10;

// ===== Validation Limits =====

/// Maximum length for an activity title
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum point reward a single activity may carry
pub const MAX_ACTIVITY_POINTS: i64 = 1_000;

/// Lowest valid priority value (low)
pub const MIN_PRIORITY: i64 = 0;

/// Highest valid priority value (high)
pub const MAX_PRIORITY: i64 = 2;

// ===== Maintenance =====

/// Interval between background maintenance sweeps (24 hours)
pub const MAINTENANCE_INTERVAL_SECS: u64 = 86_400;

/// Days of inactivity before a "we miss you" reminder is sent
pub const INACTIVITY_REMINDER_DAYS: i64 = 3;
