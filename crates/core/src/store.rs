//! Bounded in-memory assessment store.
//!
//! Records expire after a fixed time-to-live and the store never holds more than `capacity`
//! records; inserting into a full store evicts the oldest record. Nothing survives a restart.

use crate::assessment::AssessmentRecord;
use crate::assessment_id::AssessmentId;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Entries {
    records: HashMap<AssessmentId, AssessmentRecord>,
    /// Insertion order, oldest first.
    order: VecDeque<AssessmentId>,
}

/// Thread-safe store of recent assessments keyed by [`AssessmentId`].
pub struct AssessmentStore {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl AssessmentStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, record: &AssessmentRecord, now: DateTime<Utc>) -> bool {
        (now - record.timestamp)
            .to_std()
            .is_ok_and(|age| age >= self.ttl)
    }

    /// Stores `record`, purging expired records and evicting the oldest when full.
    pub fn insert(&self, record: AssessmentRecord) {
        self.insert_at(record, Utc::now());
    }

    pub(crate) fn insert_at(&self, record: AssessmentRecord, now: DateTime<Utc>) {
        let mut entries = self.lock();

        let expired: Vec<AssessmentId> = entries
            .records
            .values()
            .filter(|r| self.is_expired(r, now))
            .map(|r| r.id)
            .collect();
        for id in &expired {
            entries.records.remove(id);
        }
        if !expired.is_empty() {
            entries.order.retain(|id| !expired.contains(id));
            tracing::debug!(purged = expired.len(), "purged expired assessments");
        }

        let id = record.id;
        if entries.records.insert(id, record).is_none() {
            entries.order.push_back(id);
        }

        while entries.records.len() > self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.records.remove(&oldest);
            tracing::debug!(assessment = %oldest, "evicted oldest assessment");
        }
    }

    /// A copy of the record for `id`, unless it is unknown or expired.
    pub fn get(&self, id: &AssessmentId) -> Option<AssessmentRecord> {
        self.get_at(id, Utc::now())
    }

    pub(crate) fn get_at(&self, id: &AssessmentId, now: DateTime<Utc>) -> Option<AssessmentRecord> {
        self.lock()
            .records
            .get(id)
            .filter(|r| !self.is_expired(r, now))
            .cloned()
    }

    /// Number of records held, including any not yet purged.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
