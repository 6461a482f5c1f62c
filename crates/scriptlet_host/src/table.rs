//! In-memory script table.
//!
//! [`ScriptTable`] is the reference [`ScriptHost`]: it keeps registered
//! scripts, the activation queue and attached payloads in memory, and records
//! every call in order so callers can inspect exactly what the host was asked
//! to do.

use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::contract::{Placement, Registration, ScriptHost};
use crate::error::HostError;

/// A script as the host stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredScript {
    /// Script handle.
    pub handle: String,
    /// Source locator.
    pub source: String,
    /// Declared dependencies, verbatim.
    pub dependencies: Vec<String>,
    /// Version marker, if any.
    pub version: Option<String>,
    /// Header or footer placement.
    pub placement: Placement,
}

impl From<&Registration<'_>> for RegisteredScript {
    fn from(registration: &Registration<'_>) -> Self {
        Self {
            handle: registration.handle.to_string(),
            source: registration.source.to_string(),
            dependencies: registration.dependencies.to_vec(),
            version: registration.version.map(str::to_string),
            placement: registration.placement,
        }
    }
}

/// One call made against the table, as recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// `register_script`
    Register(RegisteredScript),
    /// `activate_script`
    Activate(String),
    /// `attach_inline`
    AttachInline {
        /// Script handle.
        handle: String,
        /// Attached code.
        code: String,
    },
    /// `attach_localized_data`
    AttachLocalized {
        /// Script handle.
        handle: String,
        /// Name the data is exposed under.
        name: String,
        /// The data mapping.
        data: Map<String, Value>,
    },
}

impl HostCall {
    /// Returns the handle the call was about.
    #[must_use]
    pub fn handle(&self) -> &str {
        match self {
            Self::Register(script) => &script.handle,
            Self::Activate(handle)
            | Self::AttachInline { handle, .. }
            | Self::AttachLocalized { handle, .. } => handle,
        }
    }
}

#[derive(Default)]
struct TableState {
    registered: HashMap<String, RegisteredScript>,
    active: Vec<String>,
    inline: HashMap<String, Vec<String>>,
    localized: HashMap<String, HashMap<String, Map<String, Value>>>,
    calls: Vec<HostCall>,
}

impl TableState {
    fn require(&self, handle: &str) -> Result<(), HostError> {
        if self.registered.contains_key(handle) {
            Ok(())
        } else {
            Err(HostError::UnknownHandle(handle.to_string()))
        }
    }
}

/// In-memory [`ScriptHost`] that records every call.
#[derive(Default)]
pub struct ScriptTable {
    state: Mutex<TableState>,
}

impl ScriptTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every call made so far, in order. Rejected calls are not recorded.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    /// Returns the calls made about one handle, in order.
    #[must_use]
    pub fn calls_for(&self, handle: &str) -> Vec<HostCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.handle() == handle)
            .cloned()
            .collect()
    }

    /// Returns the stored registration for a handle.
    #[must_use]
    pub fn registered(&self, handle: &str) -> Option<RegisteredScript> {
        self.state.lock().registered.get(handle).cloned()
    }

    /// Returns true if the handle is in the activation queue.
    #[must_use]
    pub fn is_active(&self, handle: &str) -> bool {
        self.state.lock().active.iter().any(|active| active == handle)
    }

    /// Returns the activation queue, in activation order.
    #[must_use]
    pub fn active(&self) -> Vec<String> {
        self.state.lock().active.clone()
    }

    /// Returns the inline payloads attached to a handle.
    #[must_use]
    pub fn inline_for(&self, handle: &str) -> Vec<String> {
        self.state
            .lock()
            .inline
            .get(handle)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the data currently attached to a handle under `name`.
    #[must_use]
    pub fn localized(&self, handle: &str, name: &str) -> Option<Map<String, Value>> {
        self.state
            .lock()
            .localized
            .get(handle)
            .and_then(|by_name| by_name.get(name))
            .cloned()
    }
}

impl ScriptHost for ScriptTable {
    fn register_script(&self, registration: &Registration<'_>) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if state.registered.contains_key(registration.handle) {
            return Err(HostError::AlreadyRegistered(registration.handle.to_string()));
        }

        let script = RegisteredScript::from(registration);
        state
            .registered
            .insert(script.handle.clone(), script.clone());
        state.calls.push(HostCall::Register(script));
        Ok(())
    }

    fn activate_script(&self, handle: &str) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state.require(handle)?;

        if !state.active.iter().any(|active| active == handle) {
            state.active.push(handle.to_string());
        }
        state.calls.push(HostCall::Activate(handle.to_string()));
        Ok(())
    }

    fn attach_inline(&self, handle: &str, code: &str) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state.require(handle)?;

        state
            .inline
            .entry(handle.to_string())
            .or_default()
            .push(code.to_string());
        state.calls.push(HostCall::AttachInline {
            handle: handle.to_string(),
            code: code.to_string(),
        });
        Ok(())
    }

    fn attach_localized_data(
        &self,
        handle: &str,
        name: &str,
        data: &Map<String, Value>,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock();
        state.require(handle)?;

        state
            .localized
            .entry(handle.to_string())
            .or_default()
            .insert(name.to_string(), data.clone());
        state.calls.push(HostCall::AttachLocalized {
            handle: handle.to_string(),
            name: name.to_string(),
            data: data.clone(),
        });
        Ok(())
    }
}

impl core::fmt::Debug for ScriptTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScriptTable")
            .field("registered", &state.registered.len())
            .field("active", &state.active)
            .field("calls", &state.calls.len())
            .finish()
    }
}
