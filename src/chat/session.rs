use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mutable per-connection state shared by the event pump, the policy engine
/// and the scheduler: the connection flags and the outgoing-message ledger.
///
/// Everything here is volatile. The ledger maps a conversation id to the
/// timestamp of the newest observed self-sent message; no entry means no
/// archival decision is pending for that conversation.
pub struct Session {
    connected: AtomicBool,
    paired: AtomicBool,
    ledger: Mutex<HashMap<String, i64>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            paired: AtomicBool::new(false),
            ledger: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Whether pairing has completed for the current connection attempt
    pub fn is_paired(&self) -> bool {
        self.paired.load(Ordering::SeqCst)
    }

    pub fn set_paired(&self, paired: bool) {
        self.paired.store(paired, Ordering::SeqCst);
    }

    /// Record the newest self-sent message in a conversation. At most one
    /// entry per conversation; later sends overwrite earlier ones.
    pub fn record_outgoing(&self, conversation_id: &str, timestamp: i64) {
        self.ledger
            .lock()
            .expect("ledger lock poisoned")
            .insert(conversation_id.to_string(), timestamp);
    }

    pub fn last_outgoing(&self, conversation_id: &str) -> Option<i64> {
        self.ledger
            .lock()
            .expect("ledger lock poisoned")
            .get(conversation_id)
            .copied()
    }

    /// Empty the ledger, returning how many entries were dropped.
    pub fn clear_ledger(&self) -> usize {
        let mut ledger = self.ledger.lock().expect("ledger lock poisoned");
        let removed = ledger.len();
        ledger.clear();
        removed
    }
}
