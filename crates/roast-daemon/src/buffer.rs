use roast_common::Visit;
use roast_db::ActivityStore;
use tracing::{debug, warn};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    pub persisted: usize,
    pub requeued: usize,
}

/// Visits waiting to be written. Delivery is at-least-once: a visit whose
/// write fails goes back on the queue and is tried again on the next flush.
#[derive(Debug, Default)]
pub struct PendingVisitBuffer {
    queue: Vec<Visit>,
}

impl PendingVisitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, visit: Visit) {
        self.queue.push(visit);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visits(&self) -> &[Visit] {
        &self.queue
    }

    /// Writes every queued visit. A rejected visit is requeued and the rest
    /// are still tried. A transient failure that outlasts the retry policy
    /// means the store is unavailable: that visit and every untried one are
    /// requeued in order and the flush ends, so one flush never costs more
    /// than a single retry cycle against a down store.
    pub async fn flush(&mut self, store: &dyn ActivityStore, retry: &RetryPolicy) -> FlushOutcome {
        if self.queue.is_empty() {
            return FlushOutcome::default();
        }

        let mut batch = std::mem::take(&mut self.queue).into_iter();
        let mut outcome = FlushOutcome::default();

        while let Some(visit) = batch.next() {
            match retry.run("save visit", || store.save_visit(&visit)).await {
                Ok(()) => outcome.persisted += 1,
                Err(e) if e.is_transient() => {
                    warn!(
                        "Store unavailable, deferring {} visits to the next flush: {}",
                        batch.len() + 1,
                        e
                    );
                    self.queue.push(visit);
                    self.queue.extend(batch.by_ref());
                    break;
                }
                Err(e) => {
                    warn!("Failed to save visit {} for {}: {}", visit.id, visit.app_id, e);
                    self.queue.push(visit);
                }
            }
        }

        outcome.requeued = self.queue.len();
        debug!("Flushed {} visits, {} requeued", outcome.persisted, outcome.requeued);
        outcome
    }
}
