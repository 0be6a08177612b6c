use std::collections::HashMap;
use std::panic::RefUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc as sync_mpsc;
use std::sync::{Arc, Mutex, PoisonError};

use google_logging2::api::MonitoredResource;
use tokio::sync::mpsc as async_mpsc;

use crate::auth::Credentials;
use crate::error::Error;
use crate::shipper::{self, Command, HttpTransport, Shipper, Transport};
use crate::Entry;

const DEFAULT_RESOURCE_TYPE: &str = "global";
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_BUFFER_LIMIT: usize = 10_000;
const MAX_LOG_ID_LEN: usize = 512;

/// A client that accepts log entries for asynchronous delivery.
pub trait LogClient: Send + Sync + RefUnwindSafe {
    /// Queues an entry. Never waits for the network.
    fn log(&self, entry: Entry);

    /// Blocks until every entry queued before this call has been delivered or given up on.
    fn flush(&self) -> Result<(), Error>;
}

/// Builder for the [`CloudLogger`]
#[derive(Debug)]
pub struct CloudLoggerBuilder {
    project_id: String,
    log_id: String,
    credentials_file: Option<PathBuf>,
    endpoint: String,
    resource_type: String,
    resource_labels: Option<HashMap<String, String>>,
    default_labels: HashMap<String, String>,
    batch_size: usize,
    buffer_limit: usize,
}

/// A [`LogClient`] that ships entries to Google Cloud Logging from a background thread.
///
/// Dropping the logger lets the background thread finish what is queued and exit,
/// but nothing waits for that; call [`flush`](LogClient::flush) before the process ends.
pub struct CloudLogger {
    log_name: String,
    buffer_limit: usize,
    pending: Arc<AtomicUsize>,
    dropped: AtomicUsize,
    // Set while entries are being dropped, so a full buffer is reported once.
    overflowing: AtomicBool,
    tx: Mutex<async_mpsc::UnboundedSender<Command>>,
}

impl CloudLoggerBuilder {
    /// Creates a Builder object.
    ///
    /// # Parameters
    /// - `project_id`: The Google Cloud project the log belongs to.
    /// - `log_id`: The log within that project, e.g. `my-service` or `apps/my-service`. Ends up
    ///   in the `logName` of every [LogEntry](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use googlelog::{CloudLoggerBuilder, Entry, LogClient, Severity};
    ///
    /// let logger = CloudLoggerBuilder::new("my-gcp-project", "my-log-id")
    ///     .with_credentials_file("/etc/secrets/logger.json")
    ///     .build()
    ///     .unwrap();
    ///
    /// logger.log(Entry::new(Severity::Info, serde_json::Map::new()));
    /// logger.flush().unwrap();
    /// ```
    #[must_use = "The builder must be used"]
    pub fn new(project_id: &str, log_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            log_id: log_id.to_string(),
            credentials_file: None,
            endpoint: shipper::DEFAULT_ENDPOINT.to_string(),
            resource_type: DEFAULT_RESOURCE_TYPE.to_string(),
            resource_labels: None,
            default_labels: HashMap::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            buffer_limit: DEFAULT_BUFFER_LIMIT,
        }
    }

    /// Authenticates with a service account key file instead of the metadata server.
    #[must_use = "The builder must be used"]
    pub fn with_credentials_file(self, path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_file: Some(path.into()),
            ..self
        }
    }

    /// Sets the monitored resource the entries are about.
    ///
    /// These populate the `resource` [MonitoredResource](https://cloud.google.com/logging/docs/reference/v2/rest/v2/MonitoredResource).
    /// Without it entries are written against the `global` resource of the project.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// let resource_labels = json!(
    /// {
    ///     "location": "europe-west1-b",
    ///     "pod_name": std::env::var("HOSTNAME").unwrap_or_default(),
    ///     "container_name": "my-app",
    ///     "project_id": "my-gcp-project",
    ///     "cluster_name": "my-gke-cluster",
    ///     "namespace_name": "my-gke-namespace"
    /// });
    ///
    /// use googlelog::CloudLoggerBuilder;
    /// let builder = CloudLoggerBuilder::new("my-gcp-project", "my-log-id")
    ///     .with_resource("k8s_container", resource_labels)
    ///     .unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Will return `Err` if `labels` is not a flat JSON object of strings.
    pub fn with_resource(self, resource_type: &str, labels: serde_json::Value) -> Result<Self, Error> {
        Ok(Self {
            resource_type: resource_type.to_string(),
            resource_labels: Some(
                serde_json::from_value(labels).map_err(Error::ResourceLabelsError)?,
            ),
            ..self
        })
    }

    /// Sets labels applied to every entry.
    ///
    /// These populate the `labels` field of the [LogEntry](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry).
    /// Labels set on an individual [`Entry`] take precedence.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `labels` is not a flat JSON object of strings.
    pub fn with_default_labels(self, labels: serde_json::Value) -> Result<Self, Error> {
        Ok(Self {
            default_labels: serde_json::from_value(labels).map_err(Error::DefaultLabelsError)?,
            ..self
        })
    }

    /// The most entries sent in one `entries:write` request. Defaults to 100.
    #[must_use = "The builder must be used"]
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// The most entries waiting for delivery. Entries logged beyond it are dropped. Defaults to 10000.
    #[must_use = "The builder must be used"]
    pub fn with_buffer_limit(self, buffer_limit: usize) -> Self {
        Self {
            buffer_limit,
            ..self
        }
    }

    /// Overrides `https://logging.googleapis.com`, e.g. for a proxy.
    #[must_use = "The builder must be used"]
    pub fn with_endpoint(self, endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..self
        }
    }

    /// The `logName` entries are written to: `projects/{project_id}/logs/{log_id}` with the
    /// log id URL-encoded.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the project id is empty or the log id is not a valid log id.
    pub fn log_name(&self) -> Result<String, Error> {
        if self.project_id.is_empty() {
            return Err(Error::MissingProjectId);
        }
        let valid = !self.log_id.is_empty()
            && self.log_id.len() <= MAX_LOG_ID_LEN
            && self
                .log_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.'));
        if !valid {
            return Err(Error::InvalidLogId(self.log_id.clone()));
        }
        Ok(format!(
            "projects/{}/logs/{}",
            self.project_id,
            self.log_id.replace('/', "%2F")
        ))
    }

    /// Builds a logger that writes to the Logging API over HTTPS.
    ///
    /// Credentials come from the file given to [`with_credentials_file`](Self::with_credentials_file),
    /// or else from the metadata server (workload identity).
    ///
    /// # Errors
    ///
    /// Will return `Err` on an invalid log name, an unusable credentials file or when the
    /// background shipper cannot be started.
    pub fn build(self) -> Result<CloudLogger, Error> {
        let credentials = match &self.credentials_file {
            Some(path) => Credentials::from_file(path)?,
            None => Credentials::Metadata,
        };
        let transport = HttpTransport::new(&self.endpoint, credentials)?;
        self.build_with_transport(transport)
    }

    /// Builds a logger that hands its requests to `transport`.
    ///
    /// # Errors
    ///
    /// Will return `Err` on an invalid log name or when the background shipper cannot be started.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<CloudLogger, Error> {
        let log_name = self.log_name()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;

        let resource_labels = self.resource_labels.unwrap_or_else(|| {
            HashMap::from([("project_id".to_string(), self.project_id.clone())])
        });
        let (tx, rx) = async_mpsc::unbounded_channel::<Command>();
        let pending = Arc::new(AtomicUsize::new(0));
        let shipper = Shipper::new(
            transport,
            log_name.clone(),
            MonitoredResource {
                type_: Some(self.resource_type),
                labels: Some(resource_labels),
            },
            self.default_labels,
            self.batch_size,
            pending.clone(),
            rx,
        );

        std::thread::Builder::new()
            .name("googlelog-shipper".to_string())
            .spawn(move || runtime.block_on(shipper.run()))
            .map_err(Error::Runtime)?;

        Ok(CloudLogger {
            log_name,
            buffer_limit: self.buffer_limit,
            pending,
            dropped: AtomicUsize::new(0),
            overflowing: AtomicBool::new(false),
            tx: Mutex::new(tx),
        })
    }
}

impl CloudLogger {
    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    /// Entries accepted but not yet delivered or given up on.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Entries dropped because the buffer was full, since the logger was built.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Acquire)
    }

    // Returns whether this drop starts an overflow.
    fn note_dropped(&self) -> bool {
        self.dropped.fetch_add(1, Ordering::AcqRel);
        !self.overflowing.swap(true, Ordering::AcqRel)
    }

    // Returns whether an overflow just ended.
    fn note_accepted(&self) -> bool {
        self.overflowing.load(Ordering::Acquire) && self.overflowing.swap(false, Ordering::AcqRel)
    }

    fn send(&self, command: Command) -> Result<(), Error> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(command)
            .map_err(|_| Error::ShipperGone)
    }
}

impl LogClient for CloudLogger {
    fn log(&self, entry: Entry) {
        if self.pending.fetch_add(1, Ordering::AcqRel) >= self.buffer_limit {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            if self.note_dropped() {
                eprintln!(
                    "Google Cloud Logging buffer is full ({} entries), dropping log entries",
                    self.buffer_limit
                );
            }
            return;
        }
        if self.note_accepted() {
            eprintln!(
                "Google Cloud Logging buffer has room again, {} log entries dropped so far",
                self.dropped()
            );
        }
        if self.send(Command::Entry(entry.into_log_entry())).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            eprintln!("Log shipper is not running, log entry not sent to Google Cloud Logging");
        }
    }

    fn flush(&self) -> Result<(), Error> {
        let (ack_tx, ack_rx) = sync_mpsc::sync_channel(1);
        self.send(Command::Flush(ack_tx))?;
        ack_rx.recv().map_err(|_| Error::ShipperGone)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use crate::Severity;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::Semaphore;

    fn entry(msg: &str) -> Entry {
        Entry::new(
            Severity::Info,
            json!({ "msg": msg }).as_object().unwrap().clone(),
        )
    }

    #[test]
    fn log_name_encodes_the_log_id() {
        let builder = CloudLoggerBuilder::new("my-project", "apps/ftp.server_1");
        assert_eq!(
            builder.log_name().unwrap(),
            "projects/my-project/logs/apps%2Fftp.server_1"
        );
    }

    #[test]
    fn rejects_bad_names() {
        assert!(matches!(
            CloudLoggerBuilder::new("", "log").log_name(),
            Err(Error::MissingProjectId)
        ));
        assert!(matches!(
            CloudLoggerBuilder::new("p", "").log_name(),
            Err(Error::InvalidLogId(_))
        ));
        assert!(matches!(
            CloudLoggerBuilder::new("p", "has space").log_name(),
            Err(Error::InvalidLogId(_))
        ));
        assert!(matches!(
            CloudLoggerBuilder::new("p", &"x".repeat(513)).log_name(),
            Err(Error::InvalidLogId(_))
        ));
    }

    #[test]
    fn resource_labels_must_be_strings() {
        let result =
            CloudLoggerBuilder::new("p", "l").with_resource("k8s_container", json!({"port": 1}));
        assert!(matches!(result, Err(Error::ResourceLabelsError(_))));
    }

    #[test]
    fn missing_credentials_file_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let result = CloudLoggerBuilder::new("p", "l")
            .with_credentials_file(dir.path().join("missing.json"))
            .build();
        assert!(matches!(result, Err(Error::CredentialsFile { .. })));
    }

    #[test]
    fn flush_waits_for_delivery() {
        let transport = RecordingTransport::default();
        let logger = CloudLoggerBuilder::new("p", "l")
            .build_with_transport(transport.clone())
            .unwrap();
        for msg in ["a", "b", "c"] {
            logger.log(entry(msg));
        }
        logger.flush().unwrap();

        assert_eq!(transport.entry_count(), 3);
        assert_eq!(logger.pending(), 0);
        let request = &transport.requests()[0];
        assert_eq!(request.log_name.as_deref(), Some("projects/p/logs/l"));
        let resource = request.resource.as_ref().unwrap();
        assert_eq!(resource.type_.as_deref(), Some("global"));
        assert_eq!(
            resource.labels.as_ref().unwrap().get("project_id").map(String::as_str),
            Some("p")
        );
        let first = &request.entries.as_ref().unwrap()[0];
        assert_eq!(first.severity.as_deref(), Some("INFO"));
        assert!(first.timestamp.is_some());
    }

    #[test]
    fn flush_reports_undelivered_entries() {
        let logger = CloudLoggerBuilder::new("p", "l")
            .build_with_transport(RecordingTransport::failing())
            .unwrap();
        logger.log(entry("lost"));
        match logger.flush() {
            Err(Error::Undelivered { entries, .. }) => assert_eq!(entries, 1),
            other => panic!("unexpected flush result: {:?}", other),
        }
        assert!(logger.flush().is_ok());
    }

    #[test]
    fn drops_entries_beyond_the_buffer_limit() {
        let gate = Arc::new(Semaphore::new(0));
        let transport = RecordingTransport::gated(gate.clone());
        let logger = CloudLoggerBuilder::new("p", "l")
            .with_buffer_limit(2)
            .build_with_transport(transport.clone())
            .unwrap();
        for msg in ["a", "b", "c", "d"] {
            logger.log(entry(msg));
        }
        assert_eq!(logger.pending(), 2);
        assert_eq!(logger.dropped(), 2);

        gate.add_permits(10);
        logger.flush().unwrap();
        assert_eq!(transport.entry_count(), 2);

        logger.log(entry("e"));
        logger.flush().unwrap();
        assert_eq!(transport.entry_count(), 3);
        assert_eq!(logger.dropped(), 2);
    }

    #[test]
    fn overflow_is_reported_once_per_episode() {
        let logger = CloudLoggerBuilder::new("p", "l")
            .build_with_transport(RecordingTransport::default())
            .unwrap();

        assert!(!logger.note_accepted());
        assert!(logger.note_dropped());
        assert!(!logger.note_dropped());
        assert!(!logger.note_dropped());
        assert!(logger.note_accepted());
        assert!(!logger.note_accepted());
        assert!(logger.note_dropped());
        assert_eq!(logger.dropped(), 4);
    }
}
