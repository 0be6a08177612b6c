use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc as sync_mpsc;
use std::sync::Arc;

use async_trait::async_trait;
use google_logging2::api::{LogEntry, MonitoredResource, WriteLogEntriesRequest};
use reqwest::{Client, Response};
use tokio::sync::mpsc as async_mpsc;

use crate::auth::{Credentials, Token};
use crate::error::Error;

pub(crate) const DEFAULT_ENDPOINT: &str = "https://logging.googleapis.com";

const USER_AGENT: &str = concat!("googlelog/", env!("CARGO_PKG_VERSION"));

/// What the [`CloudLogger`](crate::CloudLogger) asks of its shipper.
pub(crate) enum Command {
    Entry(LogEntry),
    /// Acknowledged once every entry queued before it has been dealt with.
    Flush(sync_mpsc::SyncSender<Result<(), Error>>),
}

pub(crate) async fn get_error_response(response: Response, context: String) -> Error {
    let status = response.status();

    let body = match response.bytes().await {
        Ok(bytes) => match serde_json::from_slice::<String>(&bytes) {
            Ok(json) => json,
            Err(_) => String::from_utf8_lossy(&bytes).to_string(),
        },
        Err(e) => format!("could not decode body of HTTP Error response: {e}"),
    };

    Error::HttpResponseError {
        context,
        status,
        body,
    }
}

/// Delivers [`WriteLogEntriesRequest`]s to Cloud Logging.
///
/// [`HttpTransport`] talks to the [Logging API](https://cloud.google.com/logging/docs/reference/v2/rest/v2/entries/write).
/// Other implementations can forward the requests elsewhere, e.g. to a local agent.
#[async_trait]
pub trait Transport: Send + 'static {
    async fn write_entries(&mut self, request: WriteLogEntriesRequest) -> Result<(), Error>;
}

/// Sends the log entries to the Google Logging API
pub(crate) struct HttpTransport {
    client: Client,
    url: String,
    token: Token,
}

impl HttpTransport {
    pub(crate) fn new(endpoint: &str, credentials: Credentials) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ShipperReqwestError {
                context: "building the HTTP client".to_string(),
                source: e,
            })?;
        Ok(HttpTransport {
            client,
            url: format!("{}/v2/entries:write", endpoint.trim_end_matches('/')),
            token: Token::new(credentials),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn write_entries(&mut self, request: WriteLogEntriesRequest) -> Result<(), Error> {
        let token = self.token.fetch_access_token(&self.client).await?;

        let response = self
            .client
            .post(self.url.as_str())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ShipperReqwestError {
                context: "performing HTTP POST request to the Google Logging API".to_string(),
                source: e,
            })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(get_error_response(
                response,
                "response when sending log entries to Google Logging API".to_string(),
            )
            .await)
        }
    }
}

/// Receives queued entries and ships them in batches through a [`Transport`].
pub(crate) struct Shipper<T> {
    transport: T,
    log_name: String,
    resource: MonitoredResource,
    labels: HashMap<String, String>,
    batch_size: usize,
    pending: Arc<AtomicUsize>,
    rx: async_mpsc::UnboundedReceiver<Command>,
    undelivered: usize,
    last_error: Option<String>,
}

impl<T: Transport> Shipper<T> {
    pub(crate) fn new(
        transport: T,
        log_name: String,
        resource: MonitoredResource,
        labels: HashMap<String, String>,
        batch_size: usize,
        pending: Arc<AtomicUsize>,
        rx: async_mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Shipper {
            transport,
            log_name,
            resource,
            labels,
            batch_size: batch_size.max(1),
            pending,
            rx,
            undelivered: 0,
            last_error: None,
        }
    }

    /// Runs until every sender is gone.
    pub(crate) async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Entry(entry) => {
                    let mut batch = vec![entry];
                    let mut flush = None;
                    while batch.len() < self.batch_size {
                        match self.rx.try_recv() {
                            Ok(Command::Entry(entry)) => batch.push(entry),
                            Ok(Command::Flush(ack)) => {
                                flush = Some(ack);
                                break;
                            }
                            Err(_) => break,
                        }
                    }
                    self.ship(batch).await;
                    if let Some(ack) = flush {
                        self.acknowledge(ack);
                    }
                }
                Command::Flush(ack) => self.acknowledge(ack),
            }
        }
    }

    fn request(&self, entries: Vec<LogEntry>) -> WriteLogEntriesRequest {
        WriteLogEntriesRequest {
            log_name: Some(self.log_name.clone()),
            resource: Some(self.resource.clone()),
            labels: (!self.labels.is_empty()).then(|| self.labels.clone()),
            entries: Some(entries),
            partial_success: Some(true),
            ..Default::default()
        }
    }

    async fn ship(&mut self, batch: Vec<LogEntry>) {
        let count = batch.len();
        let request = self.request(batch);
        if let Err(e) = self.transport.write_entries(request).await {
            eprintln!(
                "Failed to send {} log entries to Google Cloud Logging: {}",
                count, e
            );
            self.undelivered += count;
            self.last_error = Some(e.to_string());
        }
        self.pending.fetch_sub(count, Ordering::AcqRel);
    }

    fn acknowledge(&mut self, ack: sync_mpsc::SyncSender<Result<(), Error>>) {
        let result = match self.last_error.take() {
            Some(last_error) => Err(Error::Undelivered {
                entries: std::mem::take(&mut self.undelivered),
                last_error,
            }),
            None => Ok(()),
        };
        // The flushing side may have given up waiting.
        let _ = ack.send(result);
    }
}
