//! Bounded in-memory record of recent signal deliveries.

use crate::signals::SignalBus;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// The topic the signal was delivered on.
    pub topic: String,
    pub args: Vec<Value>,
    pub recorded_at: OffsetDateTime,
}

/// Keeps the last `capacity` deliveries, oldest first.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    entries: Arc<Mutex<VecDeque<AuditEntry>>>,
    capacity: usize,
}

impl AuditTrail {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Subscribe the trail to each of `topics`.
    ///
    /// Callbacks only see the arguments, so every topic gets its own
    /// subscription that remembers the name. Topics are matched exactly.
    pub fn register(&self, bus: &SignalBus, topics: &[&str]) {
        for topic in topics {
            let trail = self.clone();
            let topic = (*topic).to_string();
            bus.subscribe_fn(topic.clone(), move |args| {
                trail.push(AuditEntry {
                    topic: topic.clone(),
                    args: args.to_vec(),
                    recorded_at: OffsetDateTime::now_utc(),
                });
                Ok(())
            });
        }
    }

    fn push(&self, entry: AuditEntry) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Copy of the retained entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
