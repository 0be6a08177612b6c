use std::path::PathBuf;

use reqwest::{self, StatusCode};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("a project id is required to address Google Cloud Logging")]
    MissingProjectId,
    #[error("invalid log id '{0}': use at most 512 characters from [A-Za-z0-9/_.-]")]
    InvalidLogId(String),
    #[error("Failed to read the 'default_labels' object from the JSON value, is it a flat string map?. Parse error: {0}")]
    DefaultLabelsError(serde_json::Error),
    #[error("Failed to read the 'resource_labels' object from the JSON value, is it a flat string map?. Parse error: {0}")]
    ResourceLabelsError(serde_json::Error),
    #[error("could not read the credentials file '{path}': {source}")]
    CredentialsFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("the credentials file '{path}' is not a service account key: {source}")]
    CredentialsFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("the private key of service account '{account}' is unusable: {source}")]
    PrivateKey {
        account: String,
        source: jsonwebtoken::errors::Error,
    },
    #[error("could not start the log shipper: {0}")]
    Runtime(std::io::Error),
    #[error("Serde JSON serialization failed with context '{context}'. Error: {source}")]
    ShipperSerializeError {
        context: String,
        source: serde_json::Error,
    },
    #[error("Reqwest error with context '{context}'. Error: {source}")]
    ShipperReqwestError {
        context: String,
        source: reqwest::Error,
    },
    #[error("signing the token request failed: {0}")]
    TokenSigning(jsonwebtoken::errors::Error),
    #[error("unsuccessful HTTP response error with context '{context}'. HTTP status code: '{status}', body: '{body}'")]
    HttpResponseError {
        context: String,
        status: StatusCode,
        body: String,
    },
    #[error("the log shipper is not running")]
    ShipperGone,
    #[error("{entries} log entries could not be delivered, last error: {last_error}")]
    Undelivered { entries: usize, last_error: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::ShipperReqwestError {
            context: "Error sending HTTP request".to_string(),
            source: err,
        }
    }
}
