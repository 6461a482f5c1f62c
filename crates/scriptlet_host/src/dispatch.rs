//! Phase dispatch.
//!
//! The [`PhaseDispatcher`] is the host's phase bookkeeping: it records which
//! phases have elapsed, holds the callbacks bound to phases that have not, and
//! fires them.
//!
//! # Dispatch rules
//!
//! - A phase is marked elapsed *before* its callbacks run, so a callback that
//!   asks about its own phase sees it as elapsed.
//! - Callbacks run in ascending priority, ties in registration order.
//! - A failing callback is logged and recorded in the [`DispatchReport`]; its
//!   siblings still run.
//! - A phase fires at most once. Callbacks bound after that are kept but never
//!   run, which is why scripts check [`has_elapsed`](PhaseDispatcher::has_elapsed)
//!   first.
//!
//! No lock is held while a callback runs, so callbacks may bind further phases.

use core::sync::atomic::{AtomicU64, Ordering};

use hashbrown::{HashMap, HashSet};
use parking_lot::{Mutex, RwLock};

use crate::contract::{HostServices, PhaseCallback};
use crate::error::BoxError;
use crate::phase::PhaseId;

// ─────────────────────────────────────────────────────────────────────────────
// DispatchReport
// ─────────────────────────────────────────────────────────────────────────────

/// A callback that failed while its phase was dispatched.
#[derive(Debug)]
pub struct CallbackFailure {
    /// Label the callback was bound with, usually a script handle.
    pub label: Option<String>,
    /// Priority the callback was bound with.
    pub priority: i32,
    /// The error it returned.
    pub error: BoxError,
}

/// Outcome of firing one phase.
#[derive(Debug)]
pub struct DispatchReport {
    /// The phase that was fired.
    pub phase: PhaseId,
    /// Number of callbacks invoked, failed ones included.
    pub ran: usize,
    /// Callbacks that returned an error.
    pub failures: Vec<CallbackFailure>,
}

impl DispatchReport {
    fn new(phase: PhaseId) -> Self {
        Self {
            phase,
            ran: 0,
            failures: Vec::new(),
        }
    }

    /// Returns true if every callback succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PhaseDispatcher
// ─────────────────────────────────────────────────────────────────────────────

struct CallbackEntry {
    label: Option<String>,
    priority: i32,
    seq: u64,
    callback: PhaseCallback,
}

/// Records elapsed phases and dispatches phase callbacks.
#[derive(Default)]
pub struct PhaseDispatcher {
    elapsed: RwLock<HashSet<PhaseId>>,
    pending: Mutex<HashMap<PhaseId, Vec<CallbackEntry>>>,
    next_seq: AtomicU64,
}

impl PhaseDispatcher {
    /// Creates a dispatcher with no elapsed phases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the phase has started firing.
    #[must_use]
    pub fn has_elapsed(&self, phase: PhaseId) -> bool {
        self.elapsed.read().contains(&phase)
    }

    /// Binds a callback to a phase.
    pub fn register(&self, phase: PhaseId, priority: i32, callback: PhaseCallback) {
        self.push(phase, priority, None, callback);
    }

    /// Binds a callback to a phase under `label`, which failures report.
    pub fn register_labeled(
        &self,
        phase: PhaseId,
        priority: i32,
        label: impl Into<String>,
        callback: PhaseCallback,
    ) {
        self.push(phase, priority, Some(label.into()), callback);
    }

    fn push(
        &self,
        phase: PhaseId,
        priority: i32,
        label: Option<String>,
        callback: PhaseCallback,
    ) {
        if self.has_elapsed(phase) {
            tracing::warn!(
                phase = %phase,
                priority,
                label = ?label,
                "callback bound to a phase that already fired; it will not run"
            );
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.pending
            .lock()
            .entry(phase)
            .or_default()
            .push(CallbackEntry {
                label,
                priority,
                seq,
                callback,
            });
    }

    /// Returns the number of callbacks waiting on the phase.
    #[must_use]
    pub fn pending_count(&self, phase: PhaseId) -> usize {
        self.pending.lock().get(&phase).map_or(0, Vec::len)
    }

    /// Fires the phase, running its callbacks against `host`.
    ///
    /// Firing a phase a second time does nothing and returns an empty report.
    pub fn fire(&self, phase: PhaseId, host: &dyn HostServices) -> DispatchReport {
        let mut report = DispatchReport::new(phase);

        if !self.elapsed.write().insert(phase) {
            tracing::debug!(phase = %phase, "phase already fired, ignoring");
            return report;
        }

        let mut entries = self.pending.lock().remove(&phase).unwrap_or_default();
        entries.sort_by_key(|entry| (entry.priority, entry.seq));

        tracing::debug!(phase = %phase, callbacks = entries.len(), "firing phase");

        for entry in entries {
            report.ran += 1;
            if let Err(error) = (entry.callback)(host) {
                tracing::error!(
                    phase = %phase,
                    label = ?entry.label,
                    priority = entry.priority,
                    error = %error,
                    "phase callback failed"
                );
                report.failures.push(CallbackFailure {
                    label: entry.label,
                    priority: entry.priority,
                    error,
                });
            }
        }

        report
    }
}

impl core::fmt::Debug for PhaseDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let elapsed: Vec<&'static str> = self.elapsed.read().iter().map(PhaseId::name).collect();
        f.debug_struct("PhaseDispatcher")
            .field("elapsed", &elapsed)
            .finish_non_exhaustive()
    }
}
