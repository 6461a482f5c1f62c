//! Lifecycle binding.
//!
//! A script can be constructed at any point in the request, including after
//! some phases have already fired. [`bind_or_run_now`] hides that difference:
//! the routine runs immediately if its phase has elapsed and is deferred to
//! the phase otherwise.
//!
//! [`ScriptInstance::attach_lifecycle`] applies it to the three phases:
//!
//! | Phase | Routine |
//! |-------|---------|
//! | [`OnLoad`] | bind the two phases below |
//! | [`OnInit`] | register with the host |
//! | [`OnRender`] | run the activation pipeline |
//!
//! Binding the later phases from inside the `OnLoad` routine means
//! registration is always bound before activation.

use std::sync::Arc;

use scriptlet_host::contract::{HostServices, phase_callback};
use scriptlet_host::error::BoxError;
use scriptlet_host::phase::{OnInit, OnLoad, OnRender, PhaseId};

use crate::error::ScriptError;
use crate::instance::ScriptInstance;

/// How a routine was attached to its phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// The phase had not elapsed; the routine runs when it fires.
    Deferred,
    /// The phase had elapsed; the routine already ran.
    RanNow,
}

/// Runs `routine` now if `phase` has elapsed, otherwise defers it to the phase.
///
/// # Errors
///
/// Returns the routine's error when it runs immediately. A deferred routine's
/// error is reported by the phase dispatch instead.
pub fn bind_or_run_now<F, E>(
    host: &dyn HostServices,
    phase: PhaseId,
    priority: i32,
    routine: F,
) -> Result<Binding, E>
where
    F: Fn(&dyn HostServices) -> Result<(), E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    bind_labeled(host, phase, priority, None, routine)
}

/// [`bind_or_run_now`] with a label the dispatch report attributes failures to.
fn bind_labeled<F, E>(
    host: &dyn HostServices,
    phase: PhaseId,
    priority: i32,
    label: Option<&str>,
    routine: F,
) -> Result<Binding, E>
where
    F: Fn(&dyn HostServices) -> Result<(), E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    if host.phase_has_elapsed(phase) {
        routine(host)?;
        return Ok(Binding::RanNow);
    }

    let callback = phase_callback(move |host| routine(host).map_err(Into::into));
    match label {
        Some(label) => host.on_phase_labeled(phase, priority, label, callback),
        None => host.on_phase(phase, priority, callback),
    }
    Ok(Binding::Deferred)
}

impl ScriptInstance {
    /// Attaches the script's lifecycle to the host phases.
    ///
    /// Returns how the bootstrap routine was bound, or `None` if the
    /// lifecycle was already attached.
    ///
    /// # Errors
    ///
    /// Returns the first error of a routine that ran immediately.
    pub fn attach_lifecycle(
        self: &Arc<Self>,
        host: &dyn HostServices,
    ) -> Result<Option<Binding>, ScriptError> {
        if !self.claim_binding() {
            tracing::debug!(handle = %self.handle(), "lifecycle already attached");
            return Ok(None);
        }

        let instance = Arc::clone(self);
        self.bind(host, PhaseId::of::<OnLoad>(), move |host| {
            instance.bootstrap(host)
        })
        .map(Some)
    }

    fn bootstrap(self: &Arc<Self>, host: &dyn HostServices) -> Result<(), ScriptError> {
        let instance = Arc::clone(self);
        self.bind(host, PhaseId::of::<OnInit>(), move |host| {
            instance.register(host).map(drop)
        })?;

        let instance = Arc::clone(self);
        self.bind(host, PhaseId::of::<OnRender>(), move |host| {
            instance.activate(host).map(drop)
        })?;

        Ok(())
    }

    fn bind<F>(
        &self,
        host: &dyn HostServices,
        phase: PhaseId,
        routine: F,
    ) -> Result<Binding, ScriptError>
    where
        F: Fn(&dyn HostServices) -> Result<(), ScriptError> + Send + Sync + 'static,
    {
        let binding = bind_labeled(
            host,
            phase,
            self.descriptor().priority(),
            Some(self.handle()),
            routine,
        )?;
        tracing::debug!(
            handle = %self.handle(),
            phase = %phase,
            binding = ?binding,
            "script routine bound"
        );
        Ok(binding)
    }
}
