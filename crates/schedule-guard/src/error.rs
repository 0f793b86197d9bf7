//! Error types for schedule-guard operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid date '{0}': expected dd/MM/yyyy")]
    InvalidDate(String),

    #[error("Invalid time '{0}': expected h:mm AM/PM or HH:mm")]
    InvalidTime(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// The candidate schedule's own date/time fields could not be validated.
    #[error("Invalid date/time for schedule '{id}': {reason}")]
    InvalidInterval { id: String, reason: String },

    /// The candidate overlaps an active schedule on both dates and times.
    #[error("A schedule already overlaps this date/time range (schedule '{id}')")]
    Overlap { id: String },

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
