//! The host collaborator contract.
//!
//! Scripts never call global host functions. Everything they need from the
//! host arrives through these traits, passed in explicitly:
//!
//! | Trait | Concern |
//! |-------|---------|
//! | [`PhaseHost`] | Has a phase elapsed? Run this callback when it fires. |
//! | [`ScriptHost`] | Register, activate and attach payloads to scripts. |
//! | [`RequestContext`] | Request flags and named filters. |
//!
//! [`HostServices`] joins the three and is implemented automatically.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BoxError, HostError};
use crate::phase::PhaseId;

/// Result of a phase callback.
pub type CallbackResult = Result<(), BoxError>;

/// A callback bound to a phase.
///
/// Callbacks receive the host so they can keep binding phases and talk to the
/// script system while the phase is being dispatched.
pub type PhaseCallback = Arc<dyn Fn(&dyn HostServices) -> CallbackResult + Send + Sync>;

/// Boxes a closure as a [`PhaseCallback`].
pub fn phase_callback<F>(callback: F) -> PhaseCallback
where
    F: Fn(&dyn HostServices) -> CallbackResult + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Where the host emits a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// In the document head.
    #[default]
    Header,
    /// Before the end of the document body.
    Footer,
}

impl Placement {
    /// Returns true for [`Placement::Footer`].
    #[must_use]
    pub fn in_footer(self) -> bool {
        self == Self::Footer
    }
}

/// Everything the host needs to declare a script.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    /// Unique handle within the host's script namespace.
    pub handle: &'a str,
    /// URL or path the host loads the script from.
    pub source: &'a str,
    /// Handles this script requires, passed through untouched.
    pub dependencies: &'a [String],
    /// Cache-busting version marker, if one could be derived.
    pub version: Option<&'a str>,
    /// Header or footer placement.
    pub placement: Placement,
}

/// Phase bookkeeping side of the host.
pub trait PhaseHost {
    /// Returns true if the phase has already started firing for this request.
    fn phase_has_elapsed(&self, phase: PhaseId) -> bool;

    /// Registers a callback to run when the phase fires.
    ///
    /// Lower priorities run first; equal priorities run in registration order.
    fn on_phase(&self, phase: PhaseId, priority: i32, callback: PhaseCallback);

    /// Like [`on_phase()`](Self::on_phase), naming what the callback acts on
    /// so a failure can be attributed. Hosts that keep no labels ignore it.
    fn on_phase_labeled(
        &self,
        phase: PhaseId,
        priority: i32,
        _label: &str,
        callback: PhaseCallback,
    ) {
        self.on_phase(phase, priority, callback);
    }
}

/// Script registration and activation side of the host.
pub trait ScriptHost {
    /// Declares a script to the host without activating it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host refuses the registration.
    fn register_script(&self, registration: &Registration<'_>) -> Result<(), HostError>;

    /// Marks a registered script as live for the current render.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the handle is unknown or the host refuses.
    fn activate_script(&self, handle: &str) -> Result<(), HostError>;

    /// Attaches auxiliary code to a script.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the handle is unknown or the host refuses.
    fn attach_inline(&self, handle: &str, code: &str) -> Result<(), HostError>;

    /// Attaches a named data mapping to a script's runtime context.
    ///
    /// The host overwrites any mapping previously attached under the same name.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the handle is unknown or the host refuses.
    fn attach_localized_data(
        &self,
        handle: &str,
        name: &str,
        data: &Map<String, Value>,
    ) -> Result<(), HostError>;
}

/// Request-scoped context and override primitives.
pub trait RequestContext {
    /// Returns true if the current request is an administrative one.
    fn is_administrative(&self) -> bool;

    /// Runs `value` through every filter registered under `name`.
    ///
    /// `handle` identifies the script the value is about.
    fn apply_filter(&self, name: &str, value: bool, handle: &str) -> bool;
}

/// The complete host surface a script depends on.
pub trait HostServices: PhaseHost + ScriptHost + RequestContext {}

impl<T: PhaseHost + ScriptHost + RequestContext + ?Sized> HostServices for T {}
