//! 24+1 core library
//!
//! This library exposes the progress engine, activity and notification
//! services, and the SQLite-backed ledger store of the 24+1 app.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod services;
