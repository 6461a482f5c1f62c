//! One live instance per script type.
//!
//! [`ScriptRegistry`] constructs a script type the first time it is asked
//! for, attaches its lifecycle to the host, and hands out the same
//! [`ScriptInstance`] on every later request.
//!
//! ```
//! use scriptlet_host::prelude::*;
//! use scriptlet_script::prelude::*;
//!
//! #[derive(Default)]
//! struct Widget;
//!
//! impl Script for Widget {
//!     fn args(&self) -> ScriptArgs {
//!         ScriptArgs::new()
//!             .handle("widget-js")
//!             .source("/widget.js")
//!             .file(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))
//!     }
//! }
//!
//! let host = Host::new();
//! let registry = ScriptRegistry::new();
//!
//! let first = registry.instance::<Widget>(&host)?;
//! let again = registry.instance::<Widget>(&host)?;
//! assert!(std::sync::Arc::ptr_eq(&first, &again));
//!
//! host.run_request();
//! assert!(host.scripts().is_active("widget-js"));
//! # Ok::<(), ScriptError>(())
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use scriptlet_host::contract::{HostServices, RequestContext};
use scriptlet_host::error::BoxError;

use crate::conditional::PredicateTable;
use crate::descriptor::{DefaultsProvider, ScriptDefaults, ScriptDescriptor};
use crate::error::ScriptError;
use crate::instance::ScriptInstance;
use crate::script::{Script, ScriptId};

/// Registry of live script instances, keyed by script type.
pub struct ScriptRegistry {
    instances: RwLock<HashMap<ScriptId, Arc<ScriptInstance>>>,
    predicates: Arc<PredicateTable>,
    defaults: Box<dyn DefaultsProvider>,
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRegistry {
    /// Creates an empty registry using [`ScriptDefaults`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_defaults(ScriptDefaults::default())
    }

    /// Creates an empty registry filling absent script arguments from
    /// `defaults`.
    #[must_use]
    pub fn with_defaults(defaults: impl DefaultsProvider + 'static) -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            predicates: Arc::new(PredicateTable::new()),
            defaults: Box::new(defaults),
        }
    }

    /// Returns the instance of `S`, constructing it with `S::default()` on
    /// first use.
    ///
    /// # Errors
    ///
    /// See [`instance_with()`](Self::instance_with).
    pub fn instance<S: Script + Default>(
        &self,
        host: &dyn HostServices,
    ) -> Result<Arc<ScriptInstance>, ScriptError> {
        self.instance_with(host, S::default)
    }

    /// Returns the instance of `S`, constructing it with `build` on first use.
    ///
    /// Construction validates the descriptor, stores the instance and then
    /// attaches its lifecycle to `host`. `build` is not called if the instance
    /// already exists.
    ///
    /// # Errors
    ///
    /// - [`ScriptError::Configuration`] if a required field is missing. No
    ///   instance is stored.
    /// - [`ScriptError::DuplicateHandle`] if another type owns the handle. No
    ///   instance is stored.
    /// - Any error of a lifecycle routine that ran immediately. The instance
    ///   stays stored and bound.
    pub fn instance_with<S, F>(
        &self,
        host: &dyn HostServices,
        build: F,
    ) -> Result<Arc<ScriptInstance>, ScriptError>
    where
        S: Script,
        F: FnOnce() -> S,
    {
        let id = ScriptId::of::<S>();
        if let Some(existing) = self.instances.read().get(&id) {
            return Ok(Arc::clone(existing));
        }

        let script = build();
        let descriptor = ScriptDescriptor::with_defaults(script.args(), self.defaults.as_ref())?;

        let instance = {
            let mut instances = self.instances.write();
            if let Some(existing) = instances.get(&id) {
                return Ok(Arc::clone(existing));
            }
            if instances
                .values()
                .any(|other| other.handle() == descriptor.handle())
            {
                return Err(ScriptError::DuplicateHandle(descriptor.handle().to_string()));
            }

            let instance = Arc::new(ScriptInstance::new(
                script,
                descriptor,
                Arc::clone(&self.predicates),
            ));
            instances.insert(id, Arc::clone(&instance));
            instance
        };

        tracing::debug!(
            script = %id,
            handle = %instance.handle(),
            priority = instance.descriptor().priority(),
            "script constructed"
        );
        instance.attach_lifecycle(host)?;
        Ok(instance)
    }

    /// Returns the instance of `S`, if it has been constructed.
    #[must_use]
    pub fn get<S: Script>(&self) -> Option<Arc<ScriptInstance>> {
        self.instances.read().get(&ScriptId::of::<S>()).cloned()
    }

    /// Returns the instance owning `handle`, if any.
    #[must_use]
    pub fn get_by_handle(&self, handle: &str) -> Option<Arc<ScriptInstance>> {
        self.instances
            .read()
            .values()
            .find(|instance| instance.handle() == handle)
            .cloned()
    }

    /// Returns true if `S` has been constructed.
    #[must_use]
    pub fn contains<S: Script>(&self) -> bool {
        self.instances.read().contains_key(&ScriptId::of::<S>())
    }

    /// Returns the number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Returns true if no script has been constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// Returns the handles of all live instances, sorted.
    #[must_use]
    pub fn handles(&self) -> Vec<String> {
        let mut handles: Vec<String> = self
            .instances
            .read()
            .values()
            .map(|instance| instance.handle().to_string())
            .collect();
        handles.sort();
        handles
    }

    /// Returns the table [`ConditionalOverride::Named`](crate::conditional::ConditionalOverride::Named)
    /// overrides resolve against.
    #[must_use]
    pub fn predicates(&self) -> &PredicateTable {
        &self.predicates
    }

    /// Registers a named predicate.
    pub fn register_predicate<F>(&self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&dyn RequestContext) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.predicates.register(name, predicate);
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("handles", &self.handles())
            .field("predicates", &self.predicates)
            .finish_non_exhaustive()
    }
}
