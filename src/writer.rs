use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use googlelog::{Entry, LogClient};

use crate::config::GcpLogConfig;
use crate::error::{Error, ParseError};
use crate::level::LevelModifier;
use crate::metrics;
use crate::parser::LogParser;

/// Turns raw log output into entries for a [`LogClient`].
///
/// Each call to [`write`](EntryWriter::write) takes one complete log line, parses it,
/// applies the [`LevelModifier`] and queues the result. One instance can be shared
/// between threads.
///
/// Through [`io::Write`] the input is a byte stream instead: lines are split on `\n`,
/// so it can be written in fragments.
pub struct EntryWriter {
    parser: LogParser,
    modifier: LevelModifier,
    client: Arc<dyn LogClient>,
    // Bytes written through `io::Write` after the last newline.
    partial: Mutex<Vec<u8>>,
}

impl EntryWriter {
    /// A writer for JSON lines that leaves the level fields alone.
    pub fn new(client: Arc<dyn LogClient>) -> Self {
        EntryWriter {
            parser: LogParser::default(),
            modifier: LevelModifier::default(),
            client,
            partial: Mutex::new(Vec::new()),
        }
    }

    /// Creates the Cloud Logging client described by `config` and a writer on top of it.
    pub fn from_config(config: &GcpLogConfig) -> Result<Self, Error> {
        let client = config.gcp.cloud_logger(&config.log_id)?;
        Ok(EntryWriter::new(Arc::new(client))
            .with_parser(config.parser)
            .with_level_modifier(config.level_modifier.clone()))
    }

    pub fn with_parser(self, parser: LogParser) -> Self {
        EntryWriter { parser, ..self }
    }

    pub fn with_level_modifier(self, modifier: LevelModifier) -> Self {
        EntryWriter { modifier, ..self }
    }

    /// Forwards one log line. On success the whole buffer counts as written, whatever
    /// ends up in the payload.
    pub fn write(&self, buf: &[u8]) -> Result<usize, ParseError> {
        let mut fields = self.parser.parse(buf).map_err(|e| {
            metrics::PARSE_FAILURES.inc();
            e
        })?;
        let severity = self.modifier.apply(&mut fields).unwrap_or_default();
        metrics::ENTRIES_FORWARDED
            .with_label_values(&[severity.as_ref()])
            .inc();
        self.client.log(Entry::new(severity, fields));
        Ok(buf.len())
    }

    /// Blocks until the client has delivered everything written so far. Meant for shutdown.
    ///
    /// An unterminated line left by [`io::Write`] is forwarded first. If it cannot be
    /// parsed it is reported on stderr and dropped.
    pub fn flush(&self) -> Result<(), googlelog::Error> {
        if let Err(err) = self.write_partial() {
            eprintln!("Dropping unterminated log line: {}", err);
        }
        self.client.flush()
    }

    fn partial(&self) -> MutexGuard<'_, Vec<u8>> {
        self.partial.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forwards every complete line of `partial`, keeping the unterminated rest.
    /// All lines are forwarded even if one fails; the first failure is returned.
    fn write_lines(&self, partial: &mut Vec<u8>) -> Result<(), ParseError> {
        let mut result = Ok(());
        while let Some(end) = partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = partial.drain(..=end).collect();
            if let Err(err) = self.write_line(&line[..end]) {
                result = result.and(Err(err));
            }
        }
        result
    }

    fn write_partial(&self) -> Result<(), ParseError> {
        let line = std::mem::take(&mut *self.partial());
        self.write_line(&line)
    }

    // Blank lines are skipped.
    fn write_line(&self, line: &[u8]) -> Result<(), ParseError> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        self.write(line).map(|_| ())
    }
}

/// Splits the written bytes into lines and forwards each complete one.
///
/// A `write` that completes a line which cannot be parsed fails with
/// [`io::ErrorKind::InvalidData`]; its bytes are consumed nonetheless. `flush` forwards
/// an unterminated line but does not drain the client. Use [`EntryWriter::flush`] at
/// shutdown for that.
impl io::Write for EntryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut partial = self.partial();
        partial.extend_from_slice(buf);
        self.write_lines(&mut partial)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.write_partial()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
