use crate::app;
use clap::{Arg, Command};

pub const VERBOSITY: &str = "verbose";
pub const LOG_LEVEL: &str = "log-level";
pub const PROJECT: &str = "project";
pub const CREDENTIALS_FILE: &str = "credentials-file";
pub const LOG_ID: &str = "log-id";
pub const FORMAT: &str = "format";
pub const LEVEL_FIELD: &str = "level-field";
pub const KEEP_LEVEL_FIELD: &str = "keep-level-field";
pub const RESOURCE_TYPE: &str = "resource-type";
pub const RESOURCE_LABELS: &str = "resource-labels";
pub const LABELS: &str = "labels";
pub const BATCH_SIZE: &str = "batch-size";
pub const BUFFER_LIMIT: &str = "buffer-limit";
pub const ENDPOINT: &str = "endpoint";
pub const METRICS_FILE: &str = "metrics-file";

pub(crate) fn clap_app() -> Command<'static> {
    Command::new(app::NAME)
        .version(app::VERSION)
        .long_version(app::long_version())
        .about("Forwards log lines read from stdin to Google Cloud Logging")
        .author("The bol.com gcplog team")
        .arg(
            Arg::new(VERBOSITY)
                .short('v')
                .multiple_occurrences(true)
                .help("verbosity level of gcplog's own diagnostics"),
        )
        .arg(
            Arg::new(LOG_LEVEL)
                .long("log-level")
                .value_name("LEVEL")
                .help("Sets the level of gcplog's own diagnostics")
                .possible_values(["error", "warn", "info", "debug", "trace"])
                .env("GCPLOG_LOG_LEVEL")
                .takes_value(true),
        )
        .arg(
            Arg::new(PROJECT)
                .long("project")
                .value_name("PROJECT_ID")
                .help("The Google Cloud project that receives the entries")
                .env("GCPLOG_PROJECT")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new(CREDENTIALS_FILE)
                .long("credentials-file")
                .value_name("JSON_FILE")
                .help("A service account key file. Without it credentials come from the metadata server (workload identity)")
                .env("GCPLOG_CREDENTIALS_FILE")
                .takes_value(true),
        )
        .arg(
            Arg::new(LOG_ID)
                .long("log-id")
                .value_name("LOG_ID")
                .help("The name of the log to write to")
                .env("GCPLOG_LOG_ID")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new(FORMAT)
                .long("format")
                .value_name("FORMAT")
                .help("How input lines are read: 'json' objects or unparsed 'text'")
                .possible_values(["json", "text"])
                .default_value("json")
                .env("GCPLOG_FORMAT")
                .takes_value(true),
        )
        .arg(
            Arg::new(LEVEL_FIELD)
                .long("level-field")
                .value_name("FIELD")
                .help("The field of json lines that holds the level")
                .default_value("level")
                .env("GCPLOG_LEVEL_FIELD")
                .takes_value(true),
        )
        .arg(
            Arg::new(KEEP_LEVEL_FIELD)
                .long("keep-level-field")
                .help("Keeps the level field in the payload after it was translated into the severity")
                .env("GCPLOG_KEEP_LEVEL_FIELD"),
        )
        .arg(
            Arg::new(RESOURCE_TYPE)
                .long("resource-type")
                .value_name("TYPE")
                .help("The monitored resource type of the entries")
                .default_value("global")
                .env("GCPLOG_RESOURCE_TYPE")
                .takes_value(true),
        )
        .arg(
            Arg::new(RESOURCE_LABELS)
                .long("resource-labels")
                .value_name("JSON")
                .help("The labels of the monitored resource as a JSON object of strings")
                .env("GCPLOG_RESOURCE_LABELS")
                .takes_value(true),
        )
        .arg(
            Arg::new(LABELS)
                .long("labels")
                .value_name("JSON")
                .help("Labels added to every entry, as a JSON object of strings")
                .env("GCPLOG_LABELS")
                .takes_value(true),
        )
        .arg(
            Arg::new(BATCH_SIZE)
                .long("batch-size")
                .value_name("COUNT")
                .help("The maximum number of entries per write request")
                .default_value("100")
                .env("GCPLOG_BATCH_SIZE")
                .takes_value(true),
        )
        .arg(
            Arg::new(BUFFER_LIMIT)
                .long("buffer-limit")
                .value_name("COUNT")
                .help("The maximum number of entries waiting to be shipped. Entries beyond it are dropped")
                .default_value("10000")
                .env("GCPLOG_BUFFER_LIMIT")
                .takes_value(true),
        )
        .arg(
            Arg::new(ENDPOINT)
                .long("endpoint")
                .value_name("URL")
                .help("The base URL of the Cloud Logging API")
                .env("GCPLOG_ENDPOINT")
                .takes_value(true),
        )
        .arg(
            Arg::new(METRICS_FILE)
                .long("metrics-file")
                .value_name("PATH")
                .help("Writes the prometheus metrics to this file when stdin is exhausted")
                .env("GCPLOG_METRICS_FILE")
                .takes_value(true),
        )
}
