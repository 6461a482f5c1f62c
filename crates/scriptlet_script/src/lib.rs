//! Script resource lifecycle (Layer 2).
//!
//! A script resource is registered with the host, conditionally activated
//! on render, and optionally given an inline payload and localized data.
//! This crate decides when each of those happens relative to the host's
//! phases:
//!
//! - [`descriptor`] - Identity, metadata and settable state of a script
//! - [`script`] - The [`Script`](script::Script) trait implemented per script type
//! - [`conditional`] - Three-tier conditional resolution and its filters
//! - [`binder`] - Attaching routines to phases that may already have fired
//! - [`pipeline`] - Evaluate, register, activate, attach payloads
//! - [`registry`] - One live instance per script type
//!
//! # Lifecycle
//!
//! ```text
//! registry.instance::<S>()
//!   └─ construct + validate descriptor
//!   └─ OnLoad   (now or deferred) ─ bind the routines below
//!        ├─ OnInit   (now or deferred) ─ register with host
//!        └─ OnRender (now or deferred) ─ evaluate → activate → inline → localize
//! ```

/// Lifecycle binding.
pub mod binder;

/// Conditional activation.
pub mod conditional;

/// Script descriptors.
pub mod descriptor;

/// Script error types.
pub mod error;

/// Live script instances.
pub mod instance;

/// The activation pipeline.
pub mod pipeline;

/// Script instance registry.
pub mod registry;

/// The script trait.
pub mod script;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::binder::*;
    pub use crate::conditional::*;
    pub use crate::descriptor::*;
    pub use crate::error::*;
    pub use crate::instance::*;
    pub use crate::pipeline::*;
    pub use crate::registry::*;
    pub use crate::script::*;
}
