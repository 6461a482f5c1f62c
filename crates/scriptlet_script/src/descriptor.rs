//! Script descriptors.
//!
//! A [`ScriptDescriptor`] is the identity and metadata of one script resource.
//! It is built from [`ScriptArgs`], where every field is optional, and fails
//! fast when `handle`, `source` or `file` is missing.
//!
//! # Construction paths
//!
//! | Path | Priority | Placement |
//! |------|----------|-----------|
//! | [`ScriptDescriptor::new`] | [`BASE_PRIORITY`] | header |
//! | [`ScriptDescriptor::with_defaults`] | from the provider, [`DEFAULT_PRIORITY`] for [`ScriptDefaults`] | from the provider, footer for [`ScriptDefaults`] |
//!
//! # Example
//!
//! ```no_run
//! use scriptlet_script::descriptor::{ScriptArgs, ScriptDefaults, ScriptDescriptor};
//!
//! let args = ScriptArgs::new()
//!     .handle("widget-js")
//!     .source("/widget.js")
//!     .file("/srv/app/assets/widget.js")
//!     .dependency("jquery");
//!
//! let descriptor = ScriptDescriptor::with_defaults(args, &ScriptDefaults::default())?;
//! assert_eq!(descriptor.priority(), 25);
//! # Ok::<(), scriptlet_script::error::ScriptError>(())
//! ```

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use parking_lot::RwLock;
use scriptlet_host::contract::{Placement, Registration};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::conditional::ConditionalOverride;
use crate::error::ScriptError;

/// Priority used when a script is constructed at the base level.
pub const BASE_PRIORITY: i32 = 10;

/// Priority supplied by [`ScriptDefaults`].
pub const DEFAULT_PRIORITY: i32 = 25;

// ─────────────────────────────────────────────────────────────────────────────
// Version
// ─────────────────────────────────────────────────────────────────────────────

/// Version marker derived from a file's modification time.
///
/// Holds whole seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// Reads the modification time of `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the metadata or its modification time cannot
    /// be read.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        let seconds = modified
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Ok(Self(seconds.to_string()))
    }

    /// Returns the marker as passed to the host.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Localization
// ─────────────────────────────────────────────────────────────────────────────

/// Named data exposed to a script's runtime context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Localization {
    /// Name the data is exposed under.
    pub name: String,
    /// The data mapping.
    #[serde(alias = "object")]
    pub data: Map<String, Value>,
}

impl Localization {
    /// Creates a localization pair.
    pub fn new(name: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Returns true when both the name and the data are non-empty.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.name.is_empty() && !self.data.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScriptArgs
// ─────────────────────────────────────────────────────────────────────────────

/// Construction arguments for a script. Every field is optional here;
/// validation happens when the descriptor is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptArgs {
    handle: Option<String>,
    source: Option<String>,
    file: Option<PathBuf>,
    dependencies: Option<Vec<String>>,
    priority: Option<i32>,
    placement: Option<Placement>,
    inline: Option<String>,
    localization: Option<Localization>,
}

impl ScriptArgs {
    /// Creates empty arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handle.
    #[must_use]
    pub fn handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Sets the source locator.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the file the version is derived from.
    #[must_use]
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Replaces the dependency list.
    #[must_use]
    pub fn dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(dependencies.into_iter().map(Into::into).collect());
        self
    }

    /// Appends one dependency.
    #[must_use]
    pub fn dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies
            .get_or_insert_with(Vec::new)
            .push(dependency.into());
        self
    }

    /// Sets the phase priority.
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the placement.
    #[must_use]
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Sets the inline payload.
    #[must_use]
    pub fn inline(mut self, code: impl Into<String>) -> Self {
        self.inline = Some(code.into());
        self
    }

    /// Sets the localization pair.
    #[must_use]
    pub fn localization(mut self, name: impl Into<String>, data: Map<String, Value>) -> Self {
        self.localization = Some(Localization::new(name, data));
        self
    }

    /// Fills every absent field from `defaults`. Present fields win.
    #[must_use]
    pub fn merge(self, defaults: ScriptArgs) -> Self {
        Self {
            handle: self.handle.or(defaults.handle),
            source: self.source.or(defaults.source),
            file: self.file.or(defaults.file),
            dependencies: self.dependencies.or(defaults.dependencies),
            priority: self.priority.or(defaults.priority),
            placement: self.placement.or(defaults.placement),
            inline: self.inline.or(defaults.inline),
            localization: self.localization.or(defaults.localization),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Supplies default arguments for the default-argument construction path.
pub trait DefaultsProvider: Send + Sync {
    /// Returns the defaults to merge under a script's own arguments.
    fn defaults(&self) -> ScriptArgs;
}

/// The standard defaults provider.
///
/// Deserializable, so it can come from configuration; absent fields take the
/// values listed below.
///
/// | Field | Default |
/// |-------|---------|
/// | `dependencies` | none |
/// | `priority` | [`DEFAULT_PRIORITY`] |
/// | `placement` | footer |
/// | `inline` | none |
/// | `localization` | none |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptDefaults {
    /// Dependencies every script gets unless it declares its own.
    pub dependencies: Vec<String>,
    /// Phase priority.
    pub priority: i32,
    /// Header or footer placement.
    pub placement: Placement,
    /// Inline payload.
    pub inline: Option<String>,
    /// Localization pair.
    pub localization: Option<Localization>,
}

impl Default for ScriptDefaults {
    fn default() -> Self {
        Self {
            dependencies: Vec::new(),
            priority: DEFAULT_PRIORITY,
            placement: Placement::Footer,
            inline: None,
            localization: None,
        }
    }
}

impl ScriptDefaults {
    /// Sets the default dependencies.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the default placement.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

impl DefaultsProvider for ScriptDefaults {
    fn defaults(&self) -> ScriptArgs {
        ScriptArgs {
            dependencies: Some(self.dependencies.clone()),
            priority: Some(self.priority),
            placement: Some(self.placement),
            inline: self.inline.clone(),
            localization: self.localization.clone(),
            ..ScriptArgs::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScriptDescriptor
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Settable {
    inline: Option<String>,
    localization: Option<Localization>,
    conditional: Option<ConditionalOverride>,
}

/// Identity, metadata and attachment state of one script resource.
///
/// Identity fields are fixed at construction. The inline payload, the
/// localization pair and the conditional override can be changed through
/// setters until the script activates.
pub struct ScriptDescriptor {
    handle: String,
    source: String,
    file: PathBuf,
    dependencies: Vec<String>,
    version: Option<Version>,
    priority: i32,
    placement: Placement,
    settable: RwLock<Settable>,
    inline_attached: AtomicBool,
    registered: AtomicBool,
}

fn required<T>(
    value: Option<T>,
    field: &'static str,
    handle: Option<&str>,
    is_empty: impl Fn(&T) -> bool,
) -> Result<T, ScriptError> {
    value
        .filter(|value| !is_empty(value))
        .ok_or_else(|| ScriptError::missing_field(field, handle))
}

impl ScriptDescriptor {
    /// Builds a descriptor at the base level.
    ///
    /// Absent optional fields take the base defaults: no dependencies,
    /// [`BASE_PRIORITY`], header placement.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Configuration`] if `handle`, `source` or `file`
    /// is absent or empty.
    pub fn new(args: ScriptArgs) -> Result<Self, ScriptError> {
        let handle = required(args.handle, "handle", None, String::is_empty)?;
        let source = required(args.source, "source", Some(handle.as_str()), String::is_empty)?;
        let file = required(args.file, "file", Some(handle.as_str()), |file: &PathBuf| {
            file.as_os_str().is_empty()
        })?;

        let version = match Version::from_file(&file) {
            Ok(version) => Some(version),
            Err(error) => {
                tracing::warn!(
                    handle = %handle,
                    file = %file.display(),
                    error = %error,
                    "cannot read script modification time, registering without a version"
                );
                None
            }
        };

        Ok(Self {
            handle,
            source,
            file,
            dependencies: args.dependencies.unwrap_or_default(),
            version,
            priority: args.priority.unwrap_or(BASE_PRIORITY),
            placement: args.placement.unwrap_or(Placement::Header),
            settable: RwLock::new(Settable {
                inline: args.inline,
                localization: args.localization,
                conditional: None,
            }),
            inline_attached: AtomicBool::new(false),
            registered: AtomicBool::new(false),
        })
    }

    /// Builds a descriptor through the default-argument path, filling absent
    /// fields from `provider`.
    ///
    /// # Errors
    ///
    /// Same as [`new()`](Self::new).
    pub fn with_defaults(
        args: ScriptArgs,
        provider: &dyn DefaultsProvider,
    ) -> Result<Self, ScriptError> {
        Self::new(args.merge(provider.defaults()))
    }

    /// Returns the handle.
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Returns the source locator.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the file the version was derived from.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Returns the dependencies, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Returns the version marker, if the file's modification time was readable.
    #[must_use]
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Returns the phase priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the placement.
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Returns the registration the host receives.
    #[must_use]
    pub fn registration(&self) -> Registration<'_> {
        Registration {
            handle: &self.handle,
            source: &self.source,
            dependencies: &self.dependencies,
            version: self.version.as_ref().map(Version::as_str),
            placement: self.placement,
        }
    }

    /// Returns the current inline payload.
    #[must_use]
    pub fn inline(&self) -> Option<String> {
        self.settable.read().inline.clone()
    }

    /// Replaces the inline payload.
    ///
    /// Has no effect on the host once the payload has been attached.
    pub fn set_inline(&self, code: impl Into<String>) {
        self.settable.write().inline = Some(code.into());
    }

    /// Returns the current localization pair.
    #[must_use]
    pub fn localization(&self) -> Option<Localization> {
        self.settable.read().localization.clone()
    }

    /// Replaces the localization pair.
    pub fn set_localization(&self, name: impl Into<String>, data: Map<String, Value>) {
        self.settable.write().localization = Some(Localization::new(name, data));
    }

    /// Returns the conditional override, if one is set.
    #[must_use]
    pub fn conditional(&self) -> Option<ConditionalOverride> {
        self.settable.read().conditional.clone()
    }

    /// Sets the conditional override.
    pub fn set_conditional(&self, conditional: ConditionalOverride) {
        self.settable.write().conditional = Some(conditional);
    }

    /// Removes the conditional override.
    pub fn clear_conditional(&self) {
        self.settable.write().conditional = None;
    }

    /// Returns true once the inline payload has been attached, or while an
    /// attachment is in flight.
    #[must_use]
    pub fn inline_attached(&self) -> bool {
        self.inline_attached.load(Ordering::Acquire)
    }

    /// Claims the inline attachment. Returns false if another run holds it.
    pub(crate) fn claim_inline_attachment(&self) -> bool {
        self.inline_attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Gives the claim back after the host refused the payload.
    pub(crate) fn release_inline_attachment(&self) {
        self.inline_attached.store(false, Ordering::Release);
    }

    /// Returns true once the host has accepted the registration, or while a
    /// registration is in flight.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Claims the registration. Returns false if another run holds it.
    pub(crate) fn claim_registration(&self) -> bool {
        self.registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Gives the claim back after the host refused the registration.
    pub(crate) fn release_registration(&self) {
        self.registered.store(false, Ordering::Release);
    }
}

impl fmt::Debug for ScriptDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDescriptor")
            .field("handle", &self.handle)
            .field("source", &self.source)
            .field("file", &self.file)
            .field("dependencies", &self.dependencies)
            .field("version", &self.version)
            .field("priority", &self.priority)
            .field("placement", &self.placement)
            .field("inline_attached", &self.inline_attached())
            .field("registered", &self.is_registered())
            .finish_non_exhaustive()
    }
}
