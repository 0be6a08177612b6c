#[macro_use]
extern crate lazy_static;

mod app;
mod args;
mod logging;

use std::io::{self, BufRead};
use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::ArgMatches;
use gcplog::level::common_table;
use gcplog::{metrics, EntryWriter, GcpConfig, LevelModifier, LogParser};
use googlelog::CloudLogger;
use serde_json::json;
use slog::{debug, info, o, warn, Logger};

fn cloud_logger(arg_matches: &ArgMatches) -> Result<CloudLogger, String> {
    let project = arg_matches.value_of(args::PROJECT).unwrap();
    let log_id = arg_matches.value_of(args::LOG_ID).unwrap();

    let mut gcp = GcpConfig::new(project);
    if let Some(path) = arg_matches.value_of(args::CREDENTIALS_FILE) {
        gcp = gcp.with_credentials_file(path);
    }

    let resource_labels = match arg_matches.value_of(args::RESOURCE_LABELS) {
        Some(labels) => serde_json::from_str(labels)
            .map_err(|e| format!("--{} is not valid JSON: {}", args::RESOURCE_LABELS, e))?,
        None => json!({ "project_id": project }),
    };
    let resource_type = arg_matches.value_of(args::RESOURCE_TYPE).unwrap();
    let mut builder = gcp
        .client_builder(log_id)
        .with_resource(resource_type, resource_labels)
        .map_err(|e| e.to_string())?
        .with_batch_size(parse_count(arg_matches, args::BATCH_SIZE)?)
        .with_buffer_limit(parse_count(arg_matches, args::BUFFER_LIMIT)?);

    if let Some(labels) = arg_matches.value_of(args::LABELS) {
        let labels = serde_json::from_str(labels)
            .map_err(|e| format!("--{} is not valid JSON: {}", args::LABELS, e))?;
        builder = builder
            .with_default_labels(labels)
            .map_err(|e| e.to_string())?;
    }
    if let Some(endpoint) = arg_matches.value_of(args::ENDPOINT) {
        builder = builder.with_endpoint(endpoint);
    }

    builder
        .build()
        .map_err(|e| format!("could not create the Cloud Logging client: {}", e))
}

fn parse_count(arg_matches: &ArgMatches, name: &str) -> Result<usize, String> {
    let value = arg_matches.value_of(name).unwrap();
    match value.parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(format!("--{} must be a positive number, got '{}'", name, value)),
    }
}

fn entry_writer(arg_matches: &ArgMatches, client: CloudLogger) -> Result<EntryWriter, String> {
    let format = arg_matches.value_of(args::FORMAT).unwrap();
    let parser = format.parse::<LogParser>().map_err(|e| e.to_string())?;
    let writer = EntryWriter::new(Arc::new(client)).with_parser(parser);
    Ok(match parser {
        LogParser::Json => {
            let level_field = arg_matches.value_of(args::LEVEL_FIELD).unwrap();
            writer.with_level_modifier(
                LevelModifier::new(level_field)
                    .remove_original(!arg_matches.is_present(args::KEEP_LEVEL_FIELD))
                    .with_table(common_table()),
            )
        }
        LogParser::Text => writer,
    })
}

/// Strips the line terminator left by splitting on `\n`. `None` for blank lines.
fn trim_line(line: &[u8]) -> Option<&[u8]> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(line)
    }
}

/// Forwards every line of `input`, returning how many were forwarded and rejected.
fn forward(
    log: &Logger,
    writer: &EntryWriter,
    input: impl BufRead,
) -> Result<(u64, u64), String> {
    let (mut forwarded, mut rejected) = (0u64, 0u64);
    for (index, line) in input.split(b'\n').enumerate() {
        let line = line.map_err(|e| format!("could not read stdin: {}", e))?;
        let Some(line) = trim_line(&line) else {
            continue;
        };
        match writer.write(line) {
            Ok(_) => forwarded += 1,
            Err(err) => {
                rejected += 1;
                warn!(log, "Skipping line that could not be parsed"; "line" => index + 1, "error" => %err);
            }
        }
    }
    info!(log, "Input exhausted"; "forwarded" => forwarded, "rejected" => rejected);
    Ok((forwarded, rejected))
}

fn run(arg_matches: ArgMatches) -> Result<(), String> {
    let log = logging::create_logger(&arg_matches)?;
    let log = log.new(o!("module" => "main"));

    let client = cloud_logger(&arg_matches)?;
    info!(log, "Starting {}.", app::NAME;
        "version" => app::VERSION,
        "log-name" => client.log_name(),
        "format" => arg_matches.value_of(args::FORMAT),
    );
    let writer = entry_writer(&arg_matches, client)?;

    let forwarded = forward(&log, &writer, io::stdin().lock());

    debug!(log, "Flushing");
    let flushed = writer
        .flush()
        .map_err(|e| format!("not all entries were delivered: {}", e));

    if let Some(path) = arg_matches.value_of(args::METRICS_FILE) {
        metrics::write_textfile(Path::new(path)).map_err(|e| e.to_string())?;
    }
    forwarded.and(flushed).map(|_| ())
}

fn main() {
    let arg_matches = args::clap_app().get_matches();
    if let Err(e) = run(arg_matches) {
        eprintln!("\nError: {}", e);
        process::exit(1);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcplog::{Entry, LogClient, Severity};
    use pretty_assertions::assert_eq;
    use slog::Discard;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect {
        entries: Mutex<Vec<Entry>>,
    }

    impl LogClient for Collect {
        fn log(&self, entry: Entry) {
            self.entries.lock().unwrap().push(entry);
        }

        fn flush(&self) -> Result<(), googlelog::Error> {
            Ok(())
        }
    }

    #[test]
    fn forwards_valid_lines_and_skips_the_rest() {
        let client = Arc::new(Collect::default());
        let writer = EntryWriter::new(client.clone()).with_level_modifier(
            LevelModifier::new("level")
                .remove_original(true)
                .with_table(common_table()),
        );
        let input = Cursor::new(
            "{\"level\":\"warn\",\"msg\":\"disk\"}\r\n\
             \n\
             not json\n\
             \t \n\
             [1,2]\n\
             {\"msg\":\"last\"}",
        );
        let log = Logger::root(Discard, o!());

        assert_eq!(forward(&log, &writer, input), Ok((2, 2)));
        let entries = client.entries.lock().unwrap();
        let severities: Vec<Severity> = entries.iter().map(|e| e.severity).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Default]);
        assert_eq!(entries[0].payload.get("msg"), Some(&json!("disk")));
        assert!(entries[0].payload.get("level").is_none());
        assert_eq!(entries[1].payload.get("msg"), Some(&json!("last")));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(trim_line(b"{}\r"), Some(&b"{}"[..]));
        assert_eq!(trim_line(b"plain"), Some(&b"plain"[..]));
        assert_eq!(trim_line(b""), None);
        assert_eq!(trim_line(b" \t\r"), None);
    }

    #[test]
    fn counts_must_be_positive() {
        let m = args::clap_app()
            .try_get_matches_from(["gcplog", "--project", "p", "--log-id", "l", "--batch-size", "0"])
            .unwrap();
        assert!(parse_count(&m, args::BATCH_SIZE).is_err());
        assert_eq!(parse_count(&m, args::BUFFER_LIMIT), Ok(10000));
    }

    #[test]
    fn rejects_malformed_labels() {
        let m = args::clap_app()
            .try_get_matches_from(["gcplog", "--project", "p", "--log-id", "l", "--labels", "{"])
            .unwrap();
        assert!(matches!(cloud_logger(&m), Err(e) if e.contains("--labels")));
    }
}
