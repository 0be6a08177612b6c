use std::sync::Mutex;

use googlelog::{Entry, LogClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Log,
    Flush,
}

/// A [`LogClient`] that buffers entries until flushed and records the order of calls.
#[derive(Default)]
pub(crate) struct RecordingClient {
    calls: Mutex<Vec<Call>>,
    buffer: Mutex<Vec<Entry>>,
    delivered: Mutex<Vec<Entry>>,
}

impl RecordingClient {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Everything logged, delivered or not.
    pub(crate) fn entries(&self) -> Vec<Entry> {
        let mut entries = self.delivered();
        entries.extend(self.buffer.lock().unwrap().iter().cloned());
        entries
    }

    pub(crate) fn delivered(&self) -> Vec<Entry> {
        self.delivered.lock().unwrap().clone()
    }

    pub(crate) fn buffered(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }
}

impl LogClient for RecordingClient {
    fn log(&self, entry: Entry) {
        self.calls.lock().unwrap().push(Call::Log);
        self.buffer.lock().unwrap().push(entry);
    }

    fn flush(&self) -> Result<(), googlelog::Error> {
        let drained: Vec<Entry> = self.buffer.lock().unwrap().drain(..).collect();
        self.delivered.lock().unwrap().extend(drained);
        self.calls.lock().unwrap().push(Call::Flush);
        Ok(())
    }
}
