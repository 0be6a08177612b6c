//! Forwarding of unstructured output, one line per entry.
use crate::config::{GcpConfig, GcpLogConfig};
use crate::error::Error;
use crate::parser::LogParser;
use crate::writer::EntryWriter;

/// Creates a writer that sends every line it is given as the `message` of an entry with
/// the default severity.
///
/// The writer implements [`std::io::Write`], so it can stand in wherever plain text log
/// output is written.
///
/// ```no_run
/// use std::io::Write;
/// use gcplog::GcpConfig;
///
/// let mut writer = gcplog::new_text_writer("batch-job", &GcpConfig::new("my-project")).unwrap();
/// writer.write_all(b"job started").unwrap();
/// // Waits for delivery, unlike `io::Write::flush`.
/// gcplog::EntryWriter::flush(&writer).unwrap();
/// ```
pub fn new_text_writer(log_id: &str, gcp: &GcpConfig) -> Result<EntryWriter, Error> {
    EntryWriter::from_config(&GcpLogConfig {
        gcp: gcp.clone(),
        log_id: log_id.to_string(),
        parser: LogParser::Text,
        ..Default::default()
    })
}
