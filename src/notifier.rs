//! Lifecycle notifications: one event per job per terminal transition.

use std::collections::HashMap;

use crate::store::JobStateStore;
use crate::types::JobStatus;

/// Fallback error detail when an errored job carries none
const UNKNOWN_ERROR: &str = "unknown error";

/// A user-visible lifecycle transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A job reached `Completed`
    Completed {
        /// Job id
        id: String,
        /// Display title at the time of completion
        title: String,
    },

    /// A job reached `Errored`
    Errored {
        /// Job id
        id: String,
        /// Display title at the time of failure
        title: String,
        /// Error detail, or "unknown error" when the server reported none
        error: String,
    },
}

/// Last terminal state already notified for a job id
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NotifiedState {
    Completed,
    Errored,
}

/// De-duplicating observer of job snapshots
///
/// Holds a private map from job id to the terminal state it has already
/// announced. The map is a weak index over the live job set: ids that
/// disappear from a snapshot are pruned on the next observation, so the map
/// never outgrows the live set and a later job reusing the id notifies
/// afresh. Because the keyed value is the *last* notified state rather than
/// a one-shot latch, a job that errors, retries, and completes announces
/// both transitions.
#[derive(Debug, Default)]
pub struct LifecycleNotifier {
    notified: HashMap<String, NotifiedState>,
}

impl LifecycleNotifier {
    /// Create a notifier with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the current store contents, returning the transitions that
    /// have not been announced yet
    pub fn observe(&mut self, store: &JobStateStore) -> Vec<LifecycleEvent> {
        // Prune ids the server no longer reports
        self.notified.retain(|id, _| store.contains(id));

        let mut events = Vec::new();

        for record in store.jobs() {
            match record.status() {
                JobStatus::Completed => {
                    if self.notified.get(&record.id) != Some(&NotifiedState::Completed) {
                        events.push(LifecycleEvent::Completed {
                            id: record.id.clone(),
                            title: record.title().to_string(),
                        });
                        self.notified
                            .insert(record.id.clone(), NotifiedState::Completed);
                    }
                }
                JobStatus::Errored => {
                    if self.notified.get(&record.id) != Some(&NotifiedState::Errored) {
                        let error = record
                            .progress
                            .error
                            .clone()
                            .filter(|e| !e.is_empty())
                            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                        events.push(LifecycleEvent::Errored {
                            id: record.id.clone(),
                            title: record.title().to_string(),
                            error,
                        });
                        self.notified
                            .insert(record.id.clone(), NotifiedState::Errored);
                    }
                }
                _ => {}
            }
        }

        events
    }

    /// Number of job ids currently tracked as notified
    pub fn tracked(&self) -> usize {
        self.notified.len()
    }
}
