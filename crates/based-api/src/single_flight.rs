use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Set of conversations with a message currently in flight.
///
/// Check-and-insert happens under one lock, so two concurrent callers for the
/// same conversation can never both succeed.
#[derive(Debug, Default)]
pub struct SingleFlightGuard {
    pending: Mutex<HashSet<i64>>,
}

impl SingleFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the conversation is already pending
    pub fn try_acquire(&self, conversation_id: i64) -> bool {
        self.pending.lock().insert(conversation_id)
    }

    /// Idempotent
    pub fn release(&self, conversation_id: i64) {
        self.pending.lock().remove(&conversation_id);
    }

    pub fn is_pending(&self, conversation_id: i64) -> bool {
        self.pending.lock().contains(&conversation_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Acquire and hand back a guard that releases on drop, on every exit path
    pub fn acquire(self: &Arc<Self>, conversation_id: i64) -> Option<PendingGuard> {
        if self.try_acquire(conversation_id) {
            Some(PendingGuard {
                guard: Arc::clone(self),
                conversation_id,
            })
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct PendingGuard {
    guard: Arc<SingleFlightGuard>,
    conversation_id: i64,
}

impl PendingGuard {
    pub fn conversation_id(&self) -> i64 {
        self.conversation_id
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.guard.release(self.conversation_id);
    }
}
