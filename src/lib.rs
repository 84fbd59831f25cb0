//! Watch progress tracking for movies and TV shows
//!
//! Title views hold an optimistic per-episode cache, reconcile it with the
//! progress backend after every write, and derive season and show summaries
//! from the result.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;

pub use error::{AppError, AppResult};
