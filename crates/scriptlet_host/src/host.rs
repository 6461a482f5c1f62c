//! Reference host.
//!
//! [`Host`] composes the reference collaborators into one value implementing
//! [`HostServices`]:
//!
//! - [`PhaseDispatcher`] for phase bookkeeping
//! - [`ScriptTable`] for script registration and activation
//! - [`FilterRegistry`] for named filters
//! - [`RequestState`] for request flags
//!
//! It stands in for a real host application in tests and in the demo binary.
//!
//! # Example
//!
//! ```
//! use scriptlet_host::prelude::*;
//!
//! let host = Host::new();
//! host.on_phase(
//!     PhaseId::of::<OnInit>(),
//!     10,
//!     phase_callback(|host| {
//!         assert!(host.phase_has_elapsed(PhaseId::of::<OnLoad>()));
//!         Ok(())
//!     }),
//! );
//!
//! let reports = host.run_request();
//! assert_eq!(reports.len(), 3);
//! assert!(reports.iter().all(DispatchReport::is_clean));
//! ```

use serde_json::{Map, Value};

use crate::contract::{PhaseCallback, PhaseHost, Registration, RequestContext, ScriptHost};
use crate::dispatch::{DispatchReport, PhaseDispatcher};
use crate::error::HostError;
use crate::filter::FilterRegistry;
use crate::phase::{IntoPhaseIds, OnInit, OnLoad, OnRender, Phase, PhaseId};
use crate::request::RequestState;
use crate::table::ScriptTable;

/// In-process host built from the reference collaborators.
#[derive(Debug, Default)]
pub struct Host {
    dispatcher: PhaseDispatcher,
    scripts: ScriptTable,
    filters: FilterRegistry,
    request: RequestState,
}

impl Host {
    /// Creates a host for a regular request with no phases elapsed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host for an administrative request.
    #[must_use]
    pub fn administrative() -> Self {
        Self {
            request: RequestState::with_administrative(true),
            ..Self::default()
        }
    }

    /// Returns the phase dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &PhaseDispatcher {
        &self.dispatcher
    }

    /// Returns the script table.
    #[must_use]
    pub fn scripts(&self) -> &ScriptTable {
        &self.scripts
    }

    /// Returns the filter registry.
    #[must_use]
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Returns the request flags.
    #[must_use]
    pub fn request(&self) -> &RequestState {
        &self.request
    }

    /// Fires the phase `P`.
    pub fn fire<P: Phase>(&self) -> DispatchReport {
        self.fire_phase(PhaseId::of::<P>())
    }

    /// Fires a phase by ID. Non-generic version of [`fire()`](Self::fire).
    pub fn fire_phase(&self, phase: PhaseId) -> DispatchReport {
        self.dispatcher.fire(phase, self)
    }

    /// Fires each phase of `I` in order.
    pub fn run_phases<I: IntoPhaseIds>(&self) -> Vec<DispatchReport> {
        I::phase_ids()
            .into_iter()
            .map(|phase| self.fire_phase(phase))
            .collect()
    }

    /// Fires the built-in request sequence: load, init, render.
    pub fn run_request(&self) -> Vec<DispatchReport> {
        self.run_phases::<(OnLoad, OnInit, OnRender)>()
    }
}

impl PhaseHost for Host {
    fn phase_has_elapsed(&self, phase: PhaseId) -> bool {
        self.dispatcher.has_elapsed(phase)
    }

    fn on_phase(&self, phase: PhaseId, priority: i32, callback: PhaseCallback) {
        self.dispatcher.register(phase, priority, callback);
    }

    fn on_phase_labeled(
        &self,
        phase: PhaseId,
        priority: i32,
        label: &str,
        callback: PhaseCallback,
    ) {
        self.dispatcher.register_labeled(phase, priority, label, callback);
    }
}

impl ScriptHost for Host {
    fn register_script(&self, registration: &Registration<'_>) -> Result<(), HostError> {
        self.scripts.register_script(registration)
    }

    fn activate_script(&self, handle: &str) -> Result<(), HostError> {
        self.scripts.activate_script(handle)
    }

    fn attach_inline(&self, handle: &str, code: &str) -> Result<(), HostError> {
        self.scripts.attach_inline(handle, code)
    }

    fn attach_localized_data(
        &self,
        handle: &str,
        name: &str,
        data: &Map<String, Value>,
    ) -> Result<(), HostError> {
        self.scripts.attach_localized_data(handle, name, data)
    }
}

impl RequestContext for Host {
    fn is_administrative(&self) -> bool {
        self.request.is_administrative()
    }

    fn apply_filter(&self, name: &str, value: bool, handle: &str) -> bool {
        self.filters.apply(name, value, handle)
    }
}
