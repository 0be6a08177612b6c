//! A [slog](https://docs.rs/slog) logger that writes to Google Cloud Logging.
//!
//! Records are rendered as JSON lines into an [`EntryWriter`], which turns the `level`
//! field into the entry severity. Every line carries the fields of the record and its
//! logger, plus:
//!
//! - `msg`: the message,
//! - `level`: `trace`, `debug`, `info`, `warn`, `error` or `critical` (removed again
//!   before the entry is sent),
//! - `service`: the log id,
//! - `time`: an RFC 3339 UTC timestamp.
use std::fmt;
use std::fmt::Display;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use googlelog::{LogClient, Severity};
use serde_json::{Map, Number, Value};
use slog::{o, Drain, FnValue, Key, Level, Logger, OwnedKVList, Record, KV};

use crate::config::GcpConfig;
use crate::error::{DrainError, Error};
use crate::level::{LevelModifier, LevelTable};
use crate::parser::LogParser;
use crate::writer::EntryWriter;

pub const LEVEL_FIELD: &str = "level";
pub const MESSAGE_FIELD: &str = "msg";

/// Parses a minimum log level such as `info` or `WARN`.
pub fn parse_level(level: &str) -> Result<Level, Error> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::Trace),
        "debug" => Ok(Level::Debug),
        "info" => Ok(Level::Info),
        "warn" | "warning" => Ok(Level::Warning),
        "error" => Ok(Level::Error),
        "crit" | "critical" => Ok(Level::Critical),
        _ => Err(Error::InvalidLevel(level.to_string())),
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Trace => "trace",
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warning => "warn",
        Level::Error => "error",
        Level::Critical => "critical",
    }
}

/// The nearest severity for each slog level name.
pub fn slog_level_table() -> LevelTable {
    [
        ("trace", Severity::Debug),
        ("debug", Severity::Debug),
        ("info", Severity::Info),
        ("warn", Severity::Warning),
        ("error", Severity::Error),
        ("critical", Severity::Critical),
    ]
    .into_iter()
    .collect()
}

/// Moves the `level` written by [`JsonLines`] into the entry severity.
pub fn slog_level_modifier() -> LevelModifier {
    LevelModifier::new(LEVEL_FIELD)
        .remove_original(true)
        .with_table(slog_level_table())
}

/// Reports errors of the wrapped drain on stderr instead of passing them on.
#[derive(Clone)]
pub struct FallbackToStderr<D: Drain> {
    pub drain: D,
}

impl<D: Drain> Drain for FallbackToStderr<D>
where
    D::Err: Display,
{
    type Ok = ();
    type Err = ();
    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), ()> {
        if let Err(err) = self.drain.log(record, logger_values) {
            eprintln!("A drain could not log to its destination: {}", err);
        }
        Ok(())
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        self.drain.is_enabled(level)
    }
}

/// A drain that renders each record as one JSON line and writes it to an [`EntryWriter`].
pub struct JsonLines {
    writer: Arc<EntryWriter>,
}

impl JsonLines {
    pub fn new(writer: Arc<EntryWriter>) -> Self {
        JsonLines { writer }
    }

    fn render(record: &Record<'_>, values: &OwnedKVList) -> Result<Vec<u8>, DrainError> {
        let mut serializer = Serializer::new();
        record.kv().serialize(record, &mut serializer)?;
        values.serialize(record, &mut serializer)?;

        let mut fields = serializer.fields;
        fields.insert(
            MESSAGE_FIELD.to_string(),
            Value::String(record.msg().to_string()),
        );
        fields.insert(
            LEVEL_FIELD.to_string(),
            Value::String(level_name(record.level()).to_string()),
        );

        let mut line = serde_json::to_vec(&fields).map_err(DrainError::Encode)?;
        line.push(b'\n');
        Ok(line)
    }
}

impl Drain for JsonLines {
    type Ok = ();
    type Err = DrainError;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<Self::Ok, Self::Err> {
        let line = Self::render(record, values)?;
        self.writer.write(&line)?;
        Ok(())
    }
}

// Collects key/values as JSON. The first value of a key wins: slog emits record values
// before logger values, and a child logger's values before its parent's.
struct Serializer {
    fields: Map<String, Value>,
}

impl Serializer {
    fn new() -> Self {
        Serializer { fields: Map::new() }
    }

    fn emit_val(&mut self, key: Key, val: Value) -> slog::Result {
        self.fields.entry(key.to_string()).or_insert(val);
        Ok(())
    }

    fn emit_serde_json_number<V>(&mut self, key: Key, value: V) -> slog::Result
    where
        Number: From<V>,
    {
        self.emit_val(key, Value::Number(Number::from(value)))
    }
}

impl slog::Serializer for Serializer {
    fn emit_bool(&mut self, key: Key, val: bool) -> slog::Result {
        self.emit_val(key, Value::Bool(val))
    }

    fn emit_unit(&mut self, key: Key) -> slog::Result {
        self.emit_val(key, Value::Null)
    }

    fn emit_none(&mut self, key: Key) -> slog::Result {
        self.emit_val(key, Value::Null)
    }

    fn emit_str(&mut self, key: Key, val: &str) -> slog::Result {
        self.emit_val(key, Value::String(val.to_string()))
    }

    fn emit_char(&mut self, key: Key, val: char) -> slog::Result {
        self.emit_val(key, Value::String(val.to_string()))
    }

    fn emit_u8(&mut self, key: Key, val: u8) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_i8(&mut self, key: Key, val: i8) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_u16(&mut self, key: Key, val: u16) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_i16(&mut self, key: Key, val: i16) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_u32(&mut self, key: Key, val: u32) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_i32(&mut self, key: Key, val: i32) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_u64(&mut self, key: Key, val: u64) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_i64(&mut self, key: Key, val: i64) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_usize(&mut self, key: Key, val: usize) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_isize(&mut self, key: Key, val: isize) -> slog::Result {
        self.emit_serde_json_number(key, val)
    }

    fn emit_f32(&mut self, key: Key, val: f32) -> slog::Result {
        self.emit_f64(key, f64::from(val))
    }

    // NaN and infinities have no JSON representation.
    fn emit_f64(&mut self, key: Key, val: f64) -> slog::Result {
        let val = Number::from_f64(val).map_or(Value::Null, Value::Number);
        self.emit_val(key, val)
    }

    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments) -> slog::Result {
        self.emit_val(key, Value::String(val.to_string()))
    }
}

/// A slog [`Logger`] wired to Google Cloud Logging, plus the means to flush it.
pub struct GcpLogger {
    logger: Logger,
    writer: Arc<EntryWriter>,
}

impl GcpLogger {
    /// Creates a logger that writes to the log `log_id` of the configured project, dropping
    /// records below `level`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gcplog::{GcpConfig, GcpLogger};
    /// use slog::info;
    ///
    /// let gcp = GcpLogger::new("my-service", "info", &GcpConfig::new("my-project")).unwrap();
    /// info!(gcp.logger(), "Started"; "port" => 8080);
    /// gcp.flush().unwrap();
    /// ```
    pub fn new(log_id: &str, level: &str, gcp: &GcpConfig) -> Result<Self, Error> {
        let level = parse_level(level)?;
        let client = gcp.cloud_logger(log_id)?;
        Ok(Self::build(log_id, level, Arc::new(client)))
    }

    /// Like [`new`](Self::new), with entries going to `client`.
    pub fn with_client(
        log_id: &str,
        level: &str,
        client: Arc<dyn LogClient>,
    ) -> Result<Self, Error> {
        Ok(Self::build(log_id, parse_level(level)?, client))
    }

    fn build(log_id: &str, level: Level, client: Arc<dyn LogClient>) -> Self {
        let writer = Arc::new(
            EntryWriter::new(client)
                .with_parser(LogParser::Json)
                .with_level_modifier(slog_level_modifier()),
        );
        let drain = FallbackToStderr {
            drain: JsonLines::new(writer.clone()),
        }
        .filter_level(level)
        .fuse();
        let logger = Logger::root(
            drain,
            o!(
                "service" => log_id.to_string(),
                "time" => FnValue(|_: &Record| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
            ),
        );
        GcpLogger { logger, writer }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Blocks until everything logged so far is delivered. Call it before the process exits.
    pub fn flush(&self) -> Result<(), googlelog::Error> {
        self.writer.flush()
    }
}
