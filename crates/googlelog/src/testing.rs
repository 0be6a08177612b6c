use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use google_logging2::api::WriteLogEntriesRequest;
use reqwest::StatusCode;
use tokio::sync::Semaphore;

use crate::error::Error;
use crate::shipper::Transport;

/// Keeps every request it is given. Optionally fails them, or holds each one
/// until a permit is added to its gate.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    requests: Arc<Mutex<Vec<WriteLogEntriesRequest>>>,
    fail: bool,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingTransport {
    pub(crate) fn failing() -> Self {
        RecordingTransport {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn gated(gate: Arc<Semaphore>) -> Self {
        RecordingTransport {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<WriteLogEntriesRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.requests()
            .iter()
            .map(|r| r.entries.as_ref().map_or(0, Vec::len))
            .sum()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn write_entries(&mut self, request: WriteLogEntriesRequest) -> Result<(), Error> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(Error::HttpResponseError {
                context: "test".to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}
