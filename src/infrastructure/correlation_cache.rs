use crate::domain::user::UserId;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Entry {
    user_id: UserId,
    expires_at: Instant,
}

/// Short-lived map from a gateway checkout id to the user who started it.
///
/// Each key has one writer (the initiating request) and one reader (the
/// callback for that id), so the shard locks inside `DashMap` are enough.
/// Losing an entry is tolerated: the durable checkout record is authoritative.
#[derive(Clone)]
pub struct CorrelationCache {
    entries: Arc<DashMap<String, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl CorrelationCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn insert(&self, checkout_request_id: impl Into<String>, user_id: UserId) {
        let now = Instant::now();
        if self.entries.len() >= self.capacity {
            self.entries.retain(|_, entry| entry.expires_at > now);
        }
        // Still full of live entries: skip caching this one.
        if self.entries.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "correlation cache full, entry not cached");
            return;
        }
        self.entries.insert(
            checkout_request_id.into(),
            Entry {
                user_id,
                expires_at: now + self.ttl,
            },
        );
    }

    /// One-shot lookup: removes the entry and returns its user if still live.
    pub fn take(&self, checkout_request_id: &str) -> Option<UserId> {
        let (_, entry) = self.entries.remove(checkout_request_id)?;
        (entry.expires_at > Instant::now()).then_some(entry.user_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
