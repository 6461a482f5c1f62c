//! Phase identifiers for the host's startup sequence.
//!
//! A phase is a named point in the host lifecycle at which registered
//! callbacks fire, exactly once per request. Phases are identified by marker
//! types implementing [`Phase`] and wrapped in a [`PhaseId`].
//!
//! The host fires the built-in phases in order:
//!
//! - [`OnLoad`] - early bootstrap, everything is loaded
//! - [`OnInit`] - registration of scripts with the host
//! - [`OnRender`] - activation of scripts for the current render
//!
//! # Example
//!
//! ```
//! use scriptlet_host::phase::{Phase, PhaseId, OnInit};
//!
//! // A host-specific phase
//! pub struct OnAdminRender;
//! impl Phase for OnAdminRender {
//!     const NAME: &'static str = "admin_render";
//! }
//!
//! let phase = PhaseId::of::<OnAdminRender>();
//! assert_eq!(phase.name(), "admin_render");
//! assert_ne!(phase, PhaseId::of::<OnInit>());
//! ```

mod lifecycle;

pub use lifecycle::{OnInit, OnLoad, OnRender};

use core::any::TypeId;
use core::fmt;
use variadics_please::all_tuples;

// ─────────────────────────────────────────────────────────────────────────────
// PhaseId
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier for a host phase, derived from a marker type.
///
/// Equality and hashing follow the marker's [`TypeId`]; the name is carried
/// along for logs and filter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhaseId {
    type_id: TypeId,
    name: &'static str,
}

impl PhaseId {
    /// Creates a `PhaseId` for the given phase marker type.
    #[must_use]
    pub fn of<P: Phase>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            name: P::NAME,
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the phase's host-facing name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Phase Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Marker trait for phase types.
pub trait Phase: 'static {
    /// The name the host knows this phase by.
    const NAME: &'static str;
}

// ─────────────────────────────────────────────────────────────────────────────
// IntoPhaseIds Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for types that can be converted into an ordered list of phase IDs.
///
/// Implemented for single phases and tuples of phases, so a host can fire a
/// whole sequence with one call:
///
/// ```ignore
/// host.run_phases::<(OnLoad, OnInit, OnRender)>();
/// ```
pub trait IntoPhaseIds {
    /// Returns the phase IDs for this type, in declaration order.
    fn phase_ids() -> Vec<PhaseId>;
}

impl<P: Phase> IntoPhaseIds for P {
    fn phase_ids() -> Vec<PhaseId> {
        vec![PhaseId::of::<P>()]
    }
}

macro_rules! impl_into_phase_ids_for_tuple {
    ($($P:ident),*) => {
        impl<$($P: Phase),*> IntoPhaseIds for ($($P,)*) {
            fn phase_ids() -> Vec<PhaseId> {
                vec![$(PhaseId::of::<$P>()),*]
            }
        }
    };
}

all_tuples!(impl_into_phase_ids_for_tuple, 2, 8, P);
