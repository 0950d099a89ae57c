use std::collections::VecDeque;

use tokio::sync::oneshot;

// -----------------------------------------------------------------------------
// ----- AckOutcome ------------------------------------------------------------

/// How an in-flight command was resolved. Delivered from the listening loop
/// (or the teardown path) to the worker awaiting the acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Acknowledged,
    Rejected,
    ConnectionLost,
    Closing,
}

// -----------------------------------------------------------------------------
// ----- CorrelationTable ------------------------------------------------------

pub type CorrelationKey = u64;

/// Ordered table of in-flight commands awaiting a gateway acknowledgement.
///
/// The gateway answers on the same transport in transmission order, so
/// entries are resolved front-first; the key only exists so a timed-out
/// entry can be purged without touching its neighbours. Registration must
/// happen under the writer lock so table order equals wire order.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    next_key: CorrelationKey,
    in_flight: VecDeque<Entry>,
}

#[derive(Debug)]
struct Entry {
    key: CorrelationKey,
    tx: oneshot::Sender<AckOutcome>,
}

// -----------------------------------------------------------------------------
// ----- CorrelationTable: Public ----------------------------------------------

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry for a command about to hit the wire.
    pub fn register(&mut self) -> (CorrelationKey, oneshot::Receiver<AckOutcome>) {
        let key = self.next_key;
        self.next_key += 1;

        let (tx, rx) = oneshot::channel();
        self.in_flight.push_back(Entry { key, tx });
        (key, rx)
    }

    /// Resolve the oldest outstanding entry. Returns `false` on a stray
    /// acknowledgement with nothing in flight.
    pub fn resolve_front(&mut self, outcome: AckOutcome) -> bool {
        match self.in_flight.pop_front() {
            Some(entry) => {
                // Receiver may have timed out between ack arrival and here.
                let _ = entry.tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Drop one entry by key (timeout or failed transmit). Returns `false`
    /// if the entry was already resolved.
    pub fn purge(&mut self, key: CorrelationKey) -> bool {
        let before = self.in_flight.len();
        self.in_flight.retain(|e| e.key != key);
        self.in_flight.len() != before
    }

    /// Fail every outstanding entry, front to back. Used on transport loss
    /// and on shutdown so no worker stays blocked.
    pub fn drain(&mut self, outcome: AckOutcome) -> usize {
        let count = self.in_flight.len();
        for entry in self.in_flight.drain(..) {
            let _ = entry.tx.send(outcome);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
