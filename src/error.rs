/// Errors building a writer or logger.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to create the Google Cloud Logging client: {0}")]
    Client(#[from] googlelog::Error),
    #[error("invalid log level '{0}', expected one of trace, debug, info, warn, error or critical")]
    InvalidLevel(String),
}

/// Why a buffer could not be turned into log fields.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("failed to decode log fields: {0}")]
    Json(#[from] serde_json::Error),
    #[error("log line is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Errors of the JSON-lines slog drain.
#[derive(thiserror::Error, Debug)]
pub enum DrainError {
    #[error("could not serialize the log record: {0}")]
    Serialize(#[from] slog::Error),
    #[error("could not encode the log record as JSON: {0}")]
    Encode(serde_json::Error),
    #[error(transparent)]
    Write(#[from] ParseError),
}

/// Errors exporting the metrics.
#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
    #[error("could not write metrics to '{path}': {source}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
