//! Services module
//!
//! Business logic services that coordinate between callers and the
//! repository.

pub mod activities;
pub mod maintenance;
pub mod notifications;
pub mod progress;

pub use activities::ActivitiesService;
pub use maintenance::MaintenanceService;
pub use notifications::NotificationDispatch;
pub use progress::{CompletionOutcome, ProgressEngine};
