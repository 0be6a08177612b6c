//! A buffered client for [Google Cloud Logging](https://cloud.google.com/logging).
//!
//! # Usage
//!
//! Configure a [`CloudLogger`] with the [`CloudLoggerBuilder`] and hand it [`Entry`] values through
//! the [`LogClient`] trait. Entries are queued without blocking and shipped in batches by a
//! background thread; [`LogClient::flush`] blocks until everything queued so far is delivered.
//!
//! Credentials come either from a service account key file
//! ([`with_credentials_file`](CloudLoggerBuilder::with_credentials_file)) or from the metadata
//! server when running with [workload identity](https://cloud.google.com/iam/docs/workload-identity-federation).
//!
//! The builder supports several `with_*` methods to customize the
//! [log entries](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry), in
//! particular the monitored resource and the default labels.
//!
mod auth;
mod entry;
/// Googlelog Error types
pub mod error;
mod logger;
mod severity;
mod shipper;
#[cfg(test)]
mod testing;

pub use entry::Entry;
pub use error::Error;
pub use google_logging2::api::{LogEntry, MonitoredResource, WriteLogEntriesRequest};
pub use logger::{CloudLogger, CloudLoggerBuilder, LogClient};
pub use severity::Severity;
pub use shipper::Transport;

/// The version of this crate, sent in the user agent of every request.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
