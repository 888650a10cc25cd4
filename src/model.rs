//! Host-facing status model mapped from the server's XML documents.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique job names as reported by the listing endpoint.
pub type JobNames = BTreeSet<String>;

/// Outcome taxonomy for a job's most recent build.
///
/// The mapping from the server's ball-color vocabulary is a closed table;
/// colors introduced by newer server versions land on [`BuildStatus::Unknown`]
/// instead of failing the poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Success,
    Failure,
    Unknown,
}

/// Normalized summary of one job, rebuilt from scratch on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub name: String,
    /// Canonical job page URL as the server reports it, absolute.
    pub web_url: String,
    pub last_build_status: BuildStatus,
    /// Build number of the most recent run, when enrichment succeeded or a
    /// previous status supplied one.
    pub last_build_label: Option<String>,
    /// Local wall-clock start time of the most recent run.
    pub last_build_time: Option<NaiveDateTime>,
}

/// Metrics of one specific build run, parsed from its detail document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInformation {
    /// Server-reported epoch-milliseconds rendered as local wall-clock time.
    pub timestamp: NaiveDateTime,
    /// Build number; not assumed numeric-only.
    pub number: String,
    /// Milliseconds.
    pub duration: i64,
    /// Milliseconds; negative when the server had no estimate.
    pub estimated_duration: i64,
    pub full_display_name: String,
    pub id: String,
}
