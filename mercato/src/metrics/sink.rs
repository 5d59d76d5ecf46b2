use std::collections::VecDeque;
use std::io::Write;

use mercato_core::{CallOutcome, CallRecord};
use parking_lot::Mutex;

/// Observer invoked once per completed service call.
///
/// Sinks run on the caller's task after the collector has released its locks,
/// so they should return quickly.
pub trait CallSink: Send + Sync {
    /// Handle one completed call.
    fn on_call_recorded(&self, record: &CallRecord);
}

/// Emits one `tracing` event per call on target `mercato::calls`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl CallSink for TracingSink {
    fn on_call_recorded(&self, r: &CallRecord) {
        let providers_tried = r.providers_tried.join(",");
        let provider_used = r.provider_used.as_deref().unwrap_or("");
        match r.outcome {
            CallOutcome::Success => tracing::info!(
                target: "mercato::calls",
                data_type = r.data_type.as_str(),
                symbol = %r.symbol,
                providers_tried = %providers_tried,
                provider_used,
                outcome = "success",
                cache_hit = r.cache_hit,
                deduplicated = r.deduplicated,
                fallback_used = r.fallback_used,
                latency_ms = r.latency_ms,
                "call completed"
            ),
            CallOutcome::Failure => tracing::warn!(
                target: "mercato::calls",
                data_type = r.data_type.as_str(),
                symbol = %r.symbol,
                providers_tried = %providers_tried,
                outcome = "failure",
                cache_hit = r.cache_hit,
                deduplicated = r.deduplicated,
                fallback_used = r.fallback_used,
                latency_ms = r.latency_ms,
                error = r.error.as_ref().map(ToString::to_string).unwrap_or_default(),
                "call failed"
            ),
        }
    }
}

/// Writes every record as one JSON line.
pub struct JsonLineSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    /// Sink writing to `out`.
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl JsonLineSink<std::io::Stdout> {
    /// Sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> CallSink for JsonLineSink<W> {
    fn on_call_recorded(&self, record: &CallRecord) {
        let line = match serde_json::to_string(record) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(target: "mercato::calls", error = %e, "call record not serializable");
                return;
            }
        };
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::warn!(target: "mercato::calls", error = %e, "failed to write call record");
        }
    }
}

/// Keeps the most recent records in memory.
pub struct MemorySink {
    cap: usize,
    records: Mutex<VecDeque<CallRecord>>,
}

impl MemorySink {
    /// Sink retaining at most `cap` records.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CallSink for MemorySink {
    fn on_call_recorded(&self, record: &CallRecord) {
        let mut r = self.records.lock();
        if r.len() == self.cap {
            r.pop_front();
        }
        r.push_back(record.clone());
    }
}
