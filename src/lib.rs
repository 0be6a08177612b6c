//! Forwarding of application logs to [Google Cloud Logging](https://cloud.google.com/logging).
//!
//! Log output is written line by line into an [`EntryWriter`]. Each line is parsed into
//! fields ([`LogParser`]), the logger's own level field is translated into the entry
//! [`Severity`] ([`LevelModifier`]) and the remaining fields become the JSON payload of the
//! entry. Delivery is left to a [`LogClient`], by default the buffered
//! [`CloudLogger`](googlelog::CloudLogger).
//!
//! Two ready-made setups exist:
//!
//! 1. [`GcpLogger`]: a [slog](https://docs.rs/slog) logger whose records end up as entries
//!    with the matching severity.
//! 2. [`new_text_writer`]: a [`std::io::Write`] sink for unstructured lines.
//!
//! Entries are queued without blocking. Call `flush` before the process exits or whatever
//! is still queued is lost.
pub mod config;
pub mod error;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod parser;
pub mod text;
pub mod writer;

#[cfg(test)]
mod testing;

pub use config::{GcpConfig, GcpLogConfig};
pub use error::{Error, MetricsError, ParseError};
pub use googlelog::{Entry, LogClient, Severity};
pub use level::{LevelModifier, LevelTable};
pub use logger::{parse_level, GcpLogger};
pub use parser::{LogParser, StructuredLog};
pub use text::new_text_writer;
pub use writer::EntryWriter;
