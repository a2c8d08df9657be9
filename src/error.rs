//! Error taxonomy for the reporting core
//!
//! Field-level parse problems never show up here: they degrade to empty
//! strings, zero quantities or dropped rows inside the normalizer. What
//! remains are conditions a caller has to see and react to.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Elapsed days must be at least 1, got {0}")]
    InvalidElapsedDays(u32),

    #[error("Commission rate must be within [0, 1], got {0}")]
    InvalidCommissionRate(f64),

    #[error("Required column not found: {0}")]
    MissingColumn(String),

    #[error("Section unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream source failed: {0}")]
    Upstream(String),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
