//! Activities service
//!
//! High-level operations for creating, listing and deleting
//! activities. Input is validated before any store access.

use crate::config;
use crate::database::{Activity, CreateActivityRequest, Repository};
use crate::error::{AppError, Result};

/// Service for managing activities
#[derive(Clone)]
pub struct ActivitiesService {
    repo: Repository,
}

impl ActivitiesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new activity for a user.
    pub async fn add_activity(&self, req: CreateActivityRequest) -> Result<Activity> {
        validate(&req)?;

        tracing::info!("Creating activity '{}' for user {}", req.title, req.user_id);

        let activity = self.repo.create_activity(req).await?;

        Ok(activity)
    }

    pub async fn get_activity(&self, id: &str) -> Result<Activity> {
        self.repo.get_activity(id).await
    }

    pub async fn list_today(&self, user_id: &str) -> Result<Vec<Activity>> {
        self.repo.list_today_activities(user_id).await
    }

    pub async fn list_by_category(&self, user_id: &str, category: &str) -> Result<Vec<Activity>> {
        self.repo.list_activities_by_category(user_id, category).await
    }

    pub async fn list_pending(&self, user_id: &str) -> Result<Vec<Activity>> {
        self.repo.list_pending_activities(user_id).await
    }

    pub async fn list_completed(&self, user_id: &str) -> Result<Vec<Activity>> {
        self.repo.list_completed_activities(user_id).await
    }

    /// Delete an activity. Only the owner's row is removed; other
    /// users' data is never touched.
    pub async fn delete_activity(&self, id: &str, user_id: &str) -> Result<()> {
        let activity = self.repo.get_activity(id).await?;
        if activity.user_id != user_id {
            return Err(AppError::ActivityNotFound(id.to_string()));
        }

        tracing::info!("Deleting activity {} for user {}", id, user_id);
        self.repo.delete_activity(id).await
    }
}

fn validate(req: &CreateActivityRequest) -> Result<()> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user id must not be empty".into()));
    }
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    if req.title.len() > config::MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "title exceeds {} characters",
            config::MAX_TITLE_LENGTH
        )));
    }
    if let Some(points) = req.points {
        if points < 1 || points > config::MAX_ACTIVITY_POINTS {
            return Err(AppError::Validation(format!(
                "points must be between 1 and {}",
                config::MAX_ACTIVITY_POINTS
            )));
        }
    }
    if let Some(priority) = req.priority {
        if !(config::MIN_PRIORITY..=config::MAX_PRIORITY).contains(&priority) {
            return Err(AppError::Validation(format!(
                "priority must be between {} and {}",
                config::MIN_PRIORITY,
                config::MAX_PRIORITY
            )));
        }
    }

    Ok(())
}
