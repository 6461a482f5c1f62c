//! Live script instances.
//!
//! A [`ScriptInstance`] pairs a [`Script`] with its [`ScriptDescriptor`]. The
//! registry creates one per script type; the lifecycle binder and the
//! activation pipeline operate on it.

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use scriptlet_host::contract::{RequestContext, ScriptHost};

use crate::conditional::{PredicateTable, Resolution, Verdict};
use crate::descriptor::ScriptDescriptor;
use crate::error::ScriptError;
use crate::script::{Script, ScriptId};

/// The single live instance of a script type.
pub struct ScriptInstance {
    id: ScriptId,
    script: Box<dyn Script>,
    descriptor: ScriptDescriptor,
    predicates: Arc<PredicateTable>,
    bound: AtomicBool,
}

impl ScriptInstance {
    /// Creates an instance that resolves named overrides against `predicates`.
    #[must_use]
    pub fn new<S: Script>(
        script: S,
        descriptor: ScriptDescriptor,
        predicates: Arc<PredicateTable>,
    ) -> Self {
        Self {
            id: ScriptId::of::<S>(),
            script: Box::new(script),
            descriptor,
            predicates,
            bound: AtomicBool::new(false),
        }
    }

    /// Returns the script type's ID.
    #[must_use]
    pub fn id(&self) -> ScriptId {
        self.id
    }

    /// Returns the handle.
    #[must_use]
    pub fn handle(&self) -> &str {
        self.descriptor.handle()
    }

    /// Returns the descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ScriptDescriptor {
        &self.descriptor
    }

    /// Returns the script, if it is of type `S`.
    #[must_use]
    pub fn script<S: Script>(&self) -> Option<&S> {
        let script: &dyn Any = &*self.script;
        script.downcast_ref::<S>()
    }

    /// Returns true once the lifecycle has been attached to a host.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    /// Claims the lifecycle binding. Returns false if it was already claimed.
    pub(crate) fn claim_binding(&self) -> bool {
        !self.bound.swap(true, Ordering::AcqRel)
    }

    /// Decides whether the script activates for the current request.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Evaluation`] if the override or the script's
    /// conditional routine fails.
    pub fn evaluate(&self, ctx: &dyn RequestContext) -> Result<Verdict, ScriptError> {
        let handle = self.descriptor.handle();

        let Some(conditional) = self.descriptor.conditional() else {
            return self
                .script
                .conditional(&self.descriptor, ctx)
                .map(|activate| Verdict::new(activate, Resolution::ScriptRoutine))
                .map_err(|source| ScriptError::evaluation(handle, source));
        };

        match conditional.resolve(&self.predicates) {
            Some(predicate) => predicate(ctx)
                .map(|activate| Verdict::new(activate, Resolution::Override))
                .map_err(|source| ScriptError::evaluation(handle, source)),
            None => {
                tracing::warn!(
                    handle = %handle,
                    conditional = ?conditional,
                    "conditional override cannot be invoked, activating unconditionally"
                );
                Ok(Verdict::new(true, Resolution::Unconditional))
            }
        }
    }

    /// Declares the script to the host. Does nothing if the host has already
    /// accepted it or another run is registering it.
    ///
    /// Returns true if this call performed the registration.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::HostIntegration`] if the host refuses. A refused
    /// registration is retried by the next call.
    pub fn register(&self, host: &dyn ScriptHost) -> Result<bool, ScriptError> {
        if !self.descriptor.claim_registration() {
            return Ok(false);
        }

        let registration = self.descriptor.registration();
        if let Err(err) = host.register_script(&registration) {
            self.descriptor.release_registration();
            return Err(err.into());
        }

        tracing::info!(
            handle = %registration.handle,
            source = %registration.source,
            version = ?registration.version,
            placement = ?registration.placement,
            "script registered"
        );
        Ok(true)
    }
}

impl fmt::Debug for ScriptInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptInstance")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}
