//! Progress engine
//!
//! Owns the rules that turn activity completions into durable scoring,
//! leveling, streak and badge state, and the notification side effects
//! they trigger.
//!
//! All state-changing operations for a user run under that user's
//! async lock, so two concurrent taps cannot double-credit points or
//! double-award a badge. The engine never caches user state across
//! calls; every operation re-reads the store before deciding on
//! deltas.

use crate::config;
use crate::database::{ProgressUpdate, Repository, User};
use crate::error::{AppError, Result};
use crate::services::notifications::NotificationDispatch;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Derive a level from a cumulative point total.
/// Monotonic and deterministic; 100 points per level, starting at 1.
pub fn level_for_points(points: i64) -> i64 {
    points / config::POINTS_PER_LEVEL + 1
}

/// The daily badges, highest-value condition first. Evaluation stops
/// at the first condition that is satisfied and not yet recorded, so a
/// single completion unlocks at most one badge.
const DAILY_BADGES: [BadgeSpec; 3] = [
    BadgeSpec {
        id: "perfect_day",
        name: "Perfect Day",
        description: "Completed all of today's tasks!",
        icon: "⭐",
    },
    BadgeSpec {
        id: "productive",
        name: "Productive",
        description: "Completed 5+ tasks today!",
        icon: "💪",
    },
    BadgeSpec {
        id: "good_start",
        name: "Good Start",
        description: "Completed 3+ tasks today!",
        icon: "✨",
    },
];

const FIRST_LOGIN_BADGE: BadgeSpec = BadgeSpec {
    id: "first_login",
    name: "First Login",
    description: "Welcome to 24+1!",
    icon: "🎉",
};

struct BadgeSpec {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
}

impl BadgeSpec {
    fn satisfied(&self, completed_today: i64, total_today: i64) -> bool {
        match self.id {
            "perfect_day" => total_today > 0 && completed_today >= total_today,
            "productive" => completed_today >= config::PRODUCTIVE_THRESHOLD,
            "good_start" => completed_today >= config::GOOD_START_THRESHOLD,
            _ => false,
        }
    }
}

/// Everything one completion changed, reported back to the caller.
///
/// `side_effect_failures` carries post-commit failures (badge or
/// notification writes): the point credit stands, but the caller
/// learns the event was only partially delivered.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub activity_id: String,
    pub points_earned: i64,
    pub total_points: i64,
    pub level: i64,
    pub leveled_up: bool,
    pub current_streak: i64,
    pub today_progress: f32,
    pub badge_awarded: Option<String>,
    pub side_effect_failures: Vec<String>,
}

/// Per-user serialization point for progress mutations.
#[derive(Clone, Default)]
struct UserLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Service owning scoring, leveling, streak and badge rules
#[derive(Clone)]
pub struct ProgressEngine {
    repo: Repository,
    dispatch: NotificationDispatch,
    locks: UserLocks,
}

impl ProgressEngine {
    pub fn new(repo: Repository, dispatch: NotificationDispatch) -> Self {
        Self {
            repo,
            dispatch,
            locks: UserLocks::default(),
        }
    }

    /// Create the user on first sign-in; a no-op on every later call.
    ///
    /// Only an actual row creation triggers the first-login badge and
    /// the welcome notifications, so repeated app launches never
    /// re-award or reset anything. Returns whether the user was newly
    /// created.
    pub async fn initialize_user(&self, user_id: &str, name: &str, email: &str) -> Result<bool> {
        if user_id.trim().is_empty() {
            return Err(AppError::Validation("user id must not be empty".into()));
        }

        let _guard = self.locks.acquire(user_id).await;

        let created = self.repo.insert_user(user_id, name, email).await?;
        if created {
            tracing::info!("Initialized new user: {}", user_id);
            self.award_badge(user_id, &FIRST_LOGIN_BADGE).await?;
            self.dispatch.send_welcome(user_id).await?;
            self.dispatch.send_onboarding(user_id).await?;
        }

        Ok(created)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        name: &str,
        profile_image_ref: Option<&str>,
    ) -> Result<()> {
        self.repo
            .update_user_profile(user_id, name, profile_image_ref)
            .await
    }

    /// Mark an activity completed and apply every gamification effect.
    ///
    /// Point credit, level, streak and the completed flag commit as one
    /// transaction; a store failure there leaves everything untouched.
    /// Notifications and badge awards run after the commit and are
    /// best-effort: failures are reported in the outcome, never rolled
    /// back.
    pub async fn complete_activity(
        &self,
        activity_id: &str,
        user_id: &str,
    ) -> Result<CompletionOutcome> {
        let _guard = self.locks.acquire(user_id).await;

        let activity = self.repo.get_activity(activity_id).await?;
        if activity.user_id != user_id {
            // Another user's activity is invisible to this caller
            return Err(AppError::ActivityNotFound(activity_id.to_string()));
        }
        if activity.is_completed {
            return Err(AppError::ActivityAlreadyCompleted(activity_id.to_string()));
        }

        let user = self.repo.get_user(user_id).await?.ok_or_else(|| {
            AppError::DataIntegrity(format!(
                "activity {} references missing user {}",
                activity_id, user_id
            ))
        })?;

        let now = Utc::now();
        let completed_before = self.repo.completed_today_count(user_id).await?;
        let current_streak = if completed_before == 0 {
            // First completion of the day extends or restarts the streak
            if self.repo.completed_yesterday_count(user_id).await? > 0 {
                user.current_streak + 1
            } else {
                1
            }
        } else {
            user.current_streak
        };

        let total_points = user.total_points + activity.points;
        let level = level_for_points(total_points);
        let update = ProgressUpdate {
            total_points,
            total_activities: user.total_activities + 1,
            level,
            current_streak,
            last_active: now,
        };

        self.repo
            .apply_completion(activity_id, user_id, now, &update)
            .await?;

        tracing::info!(
            "User {} completed activity {} (+{} points, total {})",
            user_id,
            activity_id,
            activity.points,
            total_points
        );

        // Everything below is best-effort: the credit has committed.
        let mut failures = Vec::new();

        let leveled_up = level > user.level;
        if leveled_up {
            if let Err(e) = self.dispatch.send_level_up(user_id, level).await {
                tracing::error!("Level-up notification failed for {}: {}", user_id, e);
                failures.push(format!("level-up notification: {}", e));
            }
        }

        if current_streak != user.current_streak {
            if let Err(e) = self
                .dispatch
                .send_streak_milestone(user_id, current_streak)
                .await
            {
                tracing::error!("Streak notification failed for {}: {}", user_id, e);
                failures.push(format!("streak notification: {}", e));
            }
        }

        let (badge_awarded, today_progress) = match self.daily_badge_pass(user_id).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Badge evaluation failed for {}: {}", user_id, e);
                failures.push(format!("badge evaluation: {}", e));
                (None, 0.0)
            }
        };

        Ok(CompletionOutcome {
            activity_id: activity_id.to_string(),
            points_earned: activity.points,
            total_points,
            level,
            leveled_up,
            current_streak,
            today_progress,
            badge_awarded,
            side_effect_failures: failures,
        })
    }

    /// Ratio of today's completed activities to today's total, in
    /// [0, 1]. Exactly 0 when nothing was scheduled today.
    pub async fn today_progress(&self, user_id: &str) -> Result<f32> {
        let completed = self.repo.completed_today_count(user_id).await?;
        let total = self.repo.total_today_count(user_id).await?;

        Ok(progress_ratio(completed, total))
    }

    pub async fn weekly_completed_count(&self, user_id: &str) -> Result<i64> {
        self.repo.weekly_completed_count(user_id).await
    }

    pub async fn list_badges(&self, user_id: &str) -> Result<Vec<crate::database::BadgeUnlock>> {
        self.repo.list_badge_unlocks(user_id).await
    }

    /// Evaluate the daily badge cascade after a completion.
    ///
    /// Conditions already recorded for the user are skipped over, so a
    /// later threshold can still fire the same day (a perfect day
    /// after "productive" was earned earlier). At most one badge is
    /// awarded per pass.
    async fn daily_badge_pass(&self, user_id: &str) -> Result<(Option<String>, f32)> {
        let completed = self.repo.completed_today_count(user_id).await?;
        let total = self.repo.total_today_count(user_id).await?;
        let progress = progress_ratio(completed, total);

        for spec in &DAILY_BADGES {
            if !spec.satisfied(completed, total) {
                continue;
            }
            if self.award_badge(user_id, spec).await? {
                return Ok((Some(spec.id.to_string()), progress));
            }
        }

        Ok((None, progress))
    }

    /// Idempotent: the unlock row and its notification are created only
    /// when no record exists yet for (user, badge). Returns whether a
    /// new unlock happened.
    async fn award_badge(&self, user_id: &str, spec: &BadgeSpec) -> Result<bool> {
        let inserted = self
            .repo
            .insert_badge_unlock(user_id, spec.id, spec.name, spec.description, spec.icon)
            .await?;

        if inserted {
            tracing::info!("Awarded badge {} to user {}", spec.id, user_id);
            self.dispatch
                .send_badge_unlocked(user_id, spec.name, spec.icon)
                .await?;
        }

        Ok(inserted)
    }
}

fn progress_ratio(completed: i64, total: i64) -> f32 {
    if total > 0 {
        (completed as f32 / total as f32).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, CreateActivityRequest, NotificationType};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_engine() -> (ProgressEngine, Repository, NotificationDispatch) {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        let repo = Repository::new(pool);
        let dispatch = NotificationDispatch::new(repo.clone());
        let engine = ProgressEngine::new(repo.clone(), dispatch.clone());

        (engine, repo, dispatch)
    }

    #[test]
    fn test_level_derivation() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(105), 2);
        assert_eq!(level_for_points(1000), 11);
    }

    #[test]
    fn test_progress_ratio_bounds() {
        assert_eq!(progress_ratio(0, 0), 0.0);
        assert_eq!(progress_ratio(0, 4), 0.0);
        assert_eq!(progress_ratio(2, 4), 0.5);
        assert_eq!(progress_ratio(4, 4), 1.0);
    }

    #[tokio::test]
    async fn test_initialize_user_is_idempotent() {
        let (engine, repo, dispatch) = create_test_engine().await;

        let created = engine
            .initialize_user("u1", "Alice", "alice@example.com")
            .await
            .unwrap();
        assert!(created);

        for _ in 0..3 {
            let again = engine
                .initialize_user("u1", "Alice", "alice@example.com")
                .await
                .unwrap();
            assert!(!again);
        }

        let user = repo.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.total_points, 0);
        assert_eq!(user.level, 1);

        // Exactly one first_login badge
        let badges = repo.list_badge_unlocks("u1").await.unwrap();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].badge_id, "first_login");

        // Exactly one welcome notification
        let welcomes: Vec<_> = dispatch
            .list("u1")
            .await
            .unwrap()
            .into_iter()
            .filter(|n| n.title.contains("Welcome"))
            .collect();
        assert_eq!(welcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_initialize_rejects_empty_user_id() {
        let (engine, _, _) = create_test_engine().await;

        let result = engine.initialize_user("  ", "A", "a@example.com").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_completion_credits_points_and_levels_up() {
        let (engine, repo, dispatch) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        // Push the user to 95 points with a custom-valued activity
        let warmup = repo
            .create_activity(CreateActivityRequest::new("u1", "Warmup").points(95))
            .await
            .unwrap();
        let outcome = engine.complete_activity(&warmup.id, "u1").await.unwrap();
        assert_eq!(outcome.total_points, 95);
        assert_eq!(outcome.level, 1);
        assert!(!outcome.leveled_up);

        // 95 + 10 = 105 points crosses the 100-point boundary
        let task = repo
            .create_activity(CreateActivityRequest::new("u1", "Task"))
            .await
            .unwrap();
        let outcome = engine.complete_activity(&task.id, "u1").await.unwrap();
        assert_eq!(outcome.points_earned, 10);
        assert_eq!(outcome.total_points, 105);
        assert_eq!(outcome.level, 2);
        assert!(outcome.leveled_up);
        assert!(outcome.side_effect_failures.is_empty());

        let user = repo.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.total_points, 105);
        assert_eq!(user.level, 2);
        assert_eq!(user.total_activities, 2);
        assert_eq!(user.level, level_for_points(user.total_points));

        let level_ups: Vec<_> = dispatch
            .list("u1")
            .await
            .unwrap()
            .into_iter()
            .filter(|n| n.title.contains("Level Up"))
            .collect();
        assert_eq!(level_ups.len(), 1);
        assert!(level_ups[0].message.contains("Level 2"));
    }

    #[tokio::test]
    async fn test_completion_rejects_second_attempt() {
        let (engine, repo, _) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        let task = repo
            .create_activity(CreateActivityRequest::new("u1", "Task"))
            .await
            .unwrap();

        engine.complete_activity(&task.id, "u1").await.unwrap();

        let second = engine.complete_activity(&task.id, "u1").await;
        assert!(matches!(second, Err(AppError::ActivityAlreadyCompleted(_))));

        // No double credit
        let user = repo.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.total_points, 10);
        assert_eq!(user.total_activities, 1);
    }

    #[tokio::test]
    async fn test_completion_of_unknown_activity() {
        let (engine, repo, dispatch) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();
        let notifications_before = dispatch.list("u1").await.unwrap().len();

        let result = engine.complete_activity("no-such-id", "u1").await;
        assert!(matches!(result, Err(AppError::ActivityNotFound(_))));

        // No user mutation, no notification
        let user = repo.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.total_points, 0);
        assert_eq!(dispatch.list("u1").await.unwrap().len(), notifications_before);
    }

    #[tokio::test]
    async fn test_completion_of_foreign_activity_is_not_found() {
        let (engine, repo, _) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();
        engine.initialize_user("u2", "Bob", "b@example.com").await.unwrap();

        let task = repo
            .create_activity(CreateActivityRequest::new("u1", "Task"))
            .await
            .unwrap();

        let result = engine.complete_activity(&task.id, "u2").await;
        assert!(matches!(result, Err(AppError::ActivityNotFound(_))));
    }

    #[tokio::test]
    async fn test_badge_precedence_productive_over_good_start() {
        let (engine, repo, dispatch) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        let mut ids = Vec::new();
        for i in 1..=8 {
            let a = repo
                .create_activity(CreateActivityRequest::new("u1", format!("Task {}", i)))
                .await
                .unwrap();
            ids.push(a.id);
        }

        // The third completion earns good_start along the way
        for id in ids.iter().take(4) {
            engine.complete_activity(id, "u1").await.unwrap();
        }
        // Clear it so the 5th completion sees every daily badge locked
        repo.delete_badge_unlock("u1", "good_start").await.unwrap();

        let outcome = engine.complete_activity(&ids[4], "u1").await.unwrap();

        // productive wins; good_start is not separately unlocked
        assert_eq!(outcome.badge_awarded.as_deref(), Some("productive"));
        assert!(repo.get_badge_unlock("u1", "productive").await.unwrap().is_some());
        assert!(repo.get_badge_unlock("u1", "good_start").await.unwrap().is_none());

        let badge_notifications: Vec<_> = dispatch
            .list("u1")
            .await
            .unwrap()
            .into_iter()
            .filter(|n| n.title.contains("New Badge Unlocked"))
            .collect();
        // first_login + good_start (before deletion) + productive
        assert_eq!(badge_notifications.len(), 3);
    }

    #[tokio::test]
    async fn test_perfect_day_after_productive() {
        let (engine, repo, _) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        let mut ids = Vec::new();
        for i in 1..=6 {
            let a = repo
                .create_activity(CreateActivityRequest::new("u1", format!("Task {}", i)))
                .await
                .unwrap();
            ids.push(a.id);
        }

        // Completions 1..=5 earn good_start (3rd) and productive (5th)
        for id in ids.iter().take(5) {
            engine.complete_activity(id, "u1").await.unwrap();
        }
        assert!(repo.get_badge_unlock("u1", "productive").await.unwrap().is_some());

        // Final completion brings the ratio to 1.0: perfect_day fires
        // even though productive was already passed earlier today, and
        // productive is not re-awarded.
        let outcome = engine.complete_activity(&ids[5], "u1").await.unwrap();
        assert_eq!(outcome.badge_awarded.as_deref(), Some("perfect_day"));
        assert_eq!(outcome.today_progress, 1.0);

        let badges = repo.list_badge_unlocks("u1").await.unwrap();
        let productive_count = badges.iter().filter(|b| b.badge_id == "productive").count();
        assert_eq!(productive_count, 1);
    }

    #[tokio::test]
    async fn test_today_progress_bounds() {
        let (engine, repo, _) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        // No activities today: exactly zero
        assert_eq!(engine.today_progress("u1").await.unwrap(), 0.0);

        let a = repo
            .create_activity(CreateActivityRequest::new("u1", "Task"))
            .await
            .unwrap();
        let b = repo
            .create_activity(CreateActivityRequest::new("u1", "Other"))
            .await
            .unwrap();

        assert_eq!(engine.today_progress("u1").await.unwrap(), 0.0);

        engine.complete_activity(&a.id, "u1").await.unwrap();
        assert_eq!(engine.today_progress("u1").await.unwrap(), 0.5);

        engine.complete_activity(&b.id, "u1").await.unwrap();
        assert_eq!(engine.today_progress("u1").await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_streak_starts_at_one_and_holds_within_day() {
        let (engine, repo, _) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        let a = repo
            .create_activity(CreateActivityRequest::new("u1", "Task"))
            .await
            .unwrap();
        let b = repo
            .create_activity(CreateActivityRequest::new("u1", "Other"))
            .await
            .unwrap();

        // No completion yesterday: streak restarts at 1
        let outcome = engine.complete_activity(&a.id, "u1").await.unwrap();
        assert_eq!(outcome.current_streak, 1);

        // Second completion the same day leaves the streak unchanged
        let outcome = engine.complete_activity(&b.id, "u1").await.unwrap();
        assert_eq!(outcome.current_streak, 1);

        let user = repo.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.current_streak, 1);
    }

    #[tokio::test]
    async fn test_level_monotonicity_over_sequence() {
        let (engine, repo, _) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        let mut previous_level = 1;
        for i in 0..12 {
            let a = repo
                .create_activity(
                    CreateActivityRequest::new("u1", format!("Task {}", i)).points(25),
                )
                .await
                .unwrap();
            let outcome = engine.complete_activity(&a.id, "u1").await.unwrap();

            assert!(outcome.level >= previous_level);
            assert_eq!(outcome.level, level_for_points(outcome.total_points));
            previous_level = outcome.level;
        }

        let user = repo.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.total_points, 300);
        assert_eq!(user.level, 4);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (engine, repo, _) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        engine
            .update_profile("u1", "Alice B.", Some("blobs/avatar.png"))
            .await
            .unwrap();

        let user = repo.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.name, "Alice B.");
        assert_eq!(user.profile_image_ref.as_deref(), Some("blobs/avatar.png"));

        let missing = engine.update_profile("ghost", "X", None).await;
        assert!(matches!(missing, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_completions_credit_once_each() {
        let (engine, repo, _) = create_test_engine().await;
        engine.initialize_user("u1", "Alice", "a@example.com").await.unwrap();

        let task = repo
            .create_activity(CreateActivityRequest::new("u1", "Task"))
            .await
            .unwrap();

        // Two concurrent taps on the same activity: exactly one wins
        let e1 = engine.clone();
        let e2 = engine.clone();
        let id1 = task.id.clone();
        let id2 = task.id.clone();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { e1.complete_activity(&id1, "u1").await }),
            tokio::spawn(async move { e2.complete_activity(&id2, "u1").await }),
        );
        let results = [r1.unwrap(), r2.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

        let user = repo.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.total_points, 10);
        assert_eq!(user.total_activities, 1);
    }
}
