//! Application state and initialization
//!
//! All services are constructed here, once, with the store handle
//! passed in explicitly. There is no global database singleton.

use crate::database::{self, Repository};
use crate::error::Result;
use crate::services::{
    ActivitiesService, MaintenanceService, NotificationDispatch, ProgressEngine,
};
use std::path::Path;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub engine: ProgressEngine,
    pub activities: ActivitiesService,
    pub notifications: NotificationDispatch,
    pub maintenance: MaintenanceService,
}

/// Application setup - called once on startup
pub async fn setup(data_dir: &Path) -> Result<AppState> {
    tracing::info!("Initializing application in {:?}", data_dir);

    std::fs::create_dir_all(data_dir)?;

    let pool = database::create_pool(&data_dir.join("twentyfive.db")).await?;
    let repo = Repository::new(pool);

    let notifications = NotificationDispatch::new(repo.clone());
    let engine = ProgressEngine::new(repo.clone(), notifications.clone());
    let activities = ActivitiesService::new(repo.clone());
    let maintenance = MaintenanceService::new(repo.clone(), notifications.clone());

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        repo,
        engine,
        activities,
        notifications,
        maintenance,
    })
}
