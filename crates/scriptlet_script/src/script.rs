//! The [`Script`] trait and script type identity.
//!
//! A script type describes one script resource: its construction arguments
//! and, optionally, its own conditional routine. The registry keeps one live
//! instance per type.
//!
//! # Example
//!
//! ```
//! use scriptlet_host::contract::RequestContext;
//! use scriptlet_host::error::BoxError;
//! use scriptlet_script::descriptor::{ScriptArgs, ScriptDescriptor};
//! use scriptlet_script::script::Script;
//!
//! #[derive(Default)]
//! struct AdminBar;
//!
//! impl Script for AdminBar {
//!     fn args(&self) -> ScriptArgs {
//!         ScriptArgs::new()
//!             .handle("admin-bar")
//!             .source("/admin-bar.js")
//!             .file("/srv/app/assets/admin-bar.js")
//!     }
//!
//!     // Only on administrative requests.
//!     fn conditional(
//!         &self,
//!         _descriptor: &ScriptDescriptor,
//!         ctx: &dyn RequestContext,
//!     ) -> Result<bool, BoxError> {
//!         Ok(ctx.is_administrative())
//!     }
//! }
//! ```

use core::any::{Any, TypeId};
use core::fmt;

use scriptlet_host::contract::RequestContext;
use scriptlet_host::error::BoxError;

use crate::conditional::default_conditional;
use crate::descriptor::{ScriptArgs, ScriptDescriptor};

/// A script resource type.
pub trait Script: Any + Send + Sync + 'static {
    /// Returns the construction arguments.
    ///
    /// Called once, when the registry constructs the instance.
    fn args(&self) -> ScriptArgs;

    /// Decides whether the script activates for the current request.
    ///
    /// Only consulted when no invocable override is set. The provided body
    /// is [`default_conditional`].
    ///
    /// # Errors
    ///
    /// Implementations may fail; the error surfaces as
    /// [`ScriptError::Evaluation`](crate::error::ScriptError::Evaluation).
    fn conditional(
        &self,
        descriptor: &ScriptDescriptor,
        ctx: &dyn RequestContext,
    ) -> Result<bool, BoxError> {
        Ok(default_conditional(descriptor.handle(), ctx))
    }
}

/// Unique identifier for a script type.
#[derive(Clone, Copy)]
pub struct ScriptId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ScriptId {
    /// Returns the ID of the script type `S`.
    #[must_use]
    pub fn of<S: Script>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: core::any::type_name::<S>(),
        }
    }

    /// Returns the underlying [`TypeId`].
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ScriptId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ScriptId {}

impl core::hash::Hash for ScriptId {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScriptId").field(&self.type_name).finish()
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
