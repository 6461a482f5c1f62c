//! The host side of scriptlet (Layer 1).
//!
//! `scriptlet_host` defines everything a script resource needs from the
//! application hosting it, and ships an in-process reference host:
//!
//! - [`contract`] - The host collaborator traits scripts depend on
//! - [`phase`] - Phase identifiers and the built-in load → init → render phases
//! - [`dispatch`] - Phase bookkeeping and callback dispatch with failure isolation
//! - [`filter`] - Named filters used to override computed values
//! - [`request`] - Request-scoped flags
//! - [`table`] - In-memory script table recording every host call
//! - [`host`] - The reference [`Host`](host::Host) composing all of the above
//!
//! # Architecture
//!
//! - **Layer 1** (`scriptlet_host`): host contract and reference host (this crate)
//! - **Layer 2** (`scriptlet_script`): script lifecycle, conditionals, activation
//! - **Layer 3** (`scriptlet_core`): logging and configuration

/// Host collaborator traits.
pub mod contract;

/// Phase dispatch.
pub mod dispatch;

/// Host error types.
pub mod error;

/// Named filter registry.
pub mod filter;

/// Reference host.
pub mod host;

/// Phase identifiers.
pub mod phase;

/// Request-scoped flags.
pub mod request;

/// In-memory script table.
pub mod table;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::contract::*;
    pub use crate::dispatch::*;
    pub use crate::error::*;
    pub use crate::filter::*;
    pub use crate::host::*;
    pub use crate::phase::*;
    pub use crate::request::*;
    pub use crate::table::*;
}
