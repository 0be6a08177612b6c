//! Prometheus counters of the forwarding path, registered in the default registry.
use std::path::Path;

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

use crate::error::MetricsError;

lazy_static! {
    pub static ref ENTRIES_FORWARDED: IntCounterVec = register_int_counter_vec!(
        "gcplog_entries_forwarded_total",
        "Log entries handed to Google Cloud Logging, by severity.",
        &["severity"]
    )
    .expect("gcplog_entries_forwarded_total is registered once");
    pub static ref PARSE_FAILURES: IntCounter = register_int_counter!(
        "gcplog_parse_failures_total",
        "Log lines that could not be parsed and were not forwarded."
    )
    .expect("gcplog_parse_failures_total is registered once");
    pub static ref LEVEL_FALLBACKS: IntCounterVec = register_int_counter_vec!(
        "gcplog_level_fallbacks_total",
        "Entries that got the default severity because their level was absent or unknown.",
        &["reason"]
    )
    .expect("gcplog_level_fallbacks_total is registered once");
}

pub fn gather() -> Result<Vec<u8>, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(buffer)
}

/// Writes the text exposition to `path`, e.g. for the node exporter's textfile collector.
pub fn write_textfile(path: &Path) -> Result<(), MetricsError> {
    let buffer = gather()?;
    std::fs::write(path, buffer).map_err(|source| MetricsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textfile_holds_the_counters() {
        PARSE_FAILURES.inc_by(0);
        ENTRIES_FORWARDED.with_label_values(&["DEBUG"]).inc_by(0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcplog.prom");
        write_textfile(&path).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("gcplog_parse_failures_total"));
        assert!(text.contains("gcplog_entries_forwarded_total{severity=\"DEBUG\"}"));
    }

    #[test]
    fn unwritable_textfile_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("gcplog.prom");
        match write_textfile(&path) {
            Err(err @ MetricsError::Write { .. }) => {
                assert!(err.to_string().contains("gcplog.prom"), "{}", err)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
