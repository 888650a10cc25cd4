//! Blocking polling client for the Jenkins remote-access XML API.
//!
//! The client issues GETs against the server's discovery and status
//! endpoints, parses the XML responses into an owned element tree, and maps
//! them into a normalized status model the calling host can diff and render:
//!
//! * [`JenkinsPoller::all_jobs`] – the set of job names the server lists.
//! * [`JenkinsPoller::project_status`] – one job's normalized status,
//!   optionally enriched with the latest build's timing.
//! * [`JenkinsPoller::build_information`] – one build's detail metrics.
//!
//! The host owns scheduling, concurrency, and retries; every operation here
//! is a fresh synchronous round-trip with no cached or shared mutable state.

pub mod auth;
pub mod client;
pub mod error;
pub mod mapper;
pub mod model;
pub mod transport;

mod util;

pub use auth::{Auth, SecretString};
pub use client::{JenkinsPoller, JenkinsPollerBuilder};
pub use error::{Error, ErrorKind, HttpError, Result, TransportErrorKind};
pub use model::{BuildInformation, BuildStatus, JobNames, ProjectStatus};
