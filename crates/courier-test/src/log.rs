//! Call ordering assertions.

use courier_core::{BoxFuture, CancellationToken, CourierResult, Request, Response};
use courier_middleware::{BoxedHandler, Handler, Next};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, ordered list of events recorded by stages and mock senders.
///
/// Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns a snapshot of all events in order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes every event.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

struct RecordingStage {
    name: &'static str,
    log: CallLog,
}

impl Handler for RecordingStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        request: Request,
        next: Next,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, CourierResult<Response>> {
        Box::pin(async move {
            self.log.push(format!("{}.pre", self.name));
            let result = next.run(request, cancel).await;
            self.log.push(format!("{}.post", self.name));
            result
        })
    }
}

/// Creates a pass-through stage that records `<name>.pre` before calling
/// `next` and `<name>.post` after it returns, fault or not.
pub fn recording_stage(name: &'static str, log: &CallLog) -> BoxedHandler {
    Arc::new(RecordingStage {
        name,
        log: log.clone(),
    })
}
