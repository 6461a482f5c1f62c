//! Conditional activation.
//!
//! Whether a script activates for a request is decided in three tiers, first
//! match wins:
//!
//! 1. A [`ConditionalOverride`] set on the instance, when it is invocable.
//! 2. The script type's own [`Script::conditional`](crate::script::Script::conditional).
//! 3. Activate unconditionally. This includes an override that is set but
//!    cannot be invoked, which skips tier 2 entirely.
//!
//! The provided body of `Script::conditional` is [`default_conditional`]:
//! true outside administrative requests, then passed through the
//! script-specific filter and the global filter.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use scriptlet_host::contract::RequestContext;
use scriptlet_host::error::BoxError;

/// Name of the filter applied to every script's default conditional.
pub const GLOBAL_CONDITIONAL_FILTER: &str = "script.conditional";

/// Returns the name of the filter applied to one script's default conditional.
#[must_use]
pub fn conditional_filter_name(handle: &str) -> String {
    format!("{GLOBAL_CONDITIONAL_FILTER}.{handle}")
}

/// The default conditional routine.
///
/// Starts from `!is_administrative()`, then applies the filter for `handle`
/// and finally the global filter, each of which may replace the value.
pub fn default_conditional(handle: &str, ctx: &dyn RequestContext) -> bool {
    let base = !ctx.is_administrative();
    let specific = ctx.apply_filter(&conditional_filter_name(handle), base, handle);
    ctx.apply_filter(GLOBAL_CONDITIONAL_FILTER, specific, handle)
}

// ─────────────────────────────────────────────────────────────────────────────
// Overrides
// ─────────────────────────────────────────────────────────────────────────────

/// A conditional predicate.
pub type ConditionalFn = Arc<dyn Fn(&dyn RequestContext) -> Result<bool, BoxError> + Send + Sync>;

/// Boxes a closure as a [`ConditionalFn`].
pub fn conditional_fn<F>(predicate: F) -> ConditionalFn
where
    F: Fn(&dyn RequestContext) -> Result<bool, BoxError> + Send + Sync + 'static,
{
    Arc::new(predicate)
}

/// A per-instance replacement for the conditional routine.
#[derive(Clone)]
pub enum ConditionalOverride {
    /// A predicate, always invocable.
    Predicate(ConditionalFn),
    /// A reference into a [`PredicateTable`], invocable only if the name
    /// resolves when the script is evaluated.
    Named(String),
}

impl ConditionalOverride {
    /// Creates a [`Predicate`](Self::Predicate) override from a closure.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&dyn RequestContext) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self::Predicate(conditional_fn(predicate))
    }

    /// Creates a [`Named`](Self::Named) override.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Resolves the override to something callable.
    #[must_use]
    pub fn resolve(&self, predicates: &PredicateTable) -> Option<ConditionalFn> {
        match self {
            Self::Predicate(predicate) => Some(Arc::clone(predicate)),
            Self::Named(name) => predicates.get(name),
        }
    }
}

impl fmt::Debug for ConditionalOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// Named predicates that [`ConditionalOverride::Named`] refers to.
#[derive(Default)]
pub struct PredicateTable {
    predicates: RwLock<HashMap<String, ConditionalFn>>,
}

impl PredicateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a predicate, replacing any previous one of the same name.
    pub fn register<F>(&self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&dyn RequestContext) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.predicates
            .write()
            .insert(name.into(), conditional_fn(predicate));
    }

    /// Removes a predicate. Returns true if it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.predicates.write().remove(name).is_some()
    }

    /// Looks up a predicate.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ConditionalFn> {
        self.predicates.read().get(name).cloned()
    }

    /// Returns true if a predicate with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.predicates.read().contains_key(name)
    }
}

impl fmt::Debug for PredicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateTable")
            .field("names", &self.predicates.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Verdict
// ─────────────────────────────────────────────────────────────────────────────

/// Which tier decided a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// An invocable override.
    Override,
    /// The script type's conditional routine.
    ScriptRoutine,
    /// An override was set but could not be invoked.
    Unconditional,
}

/// Outcome of evaluating a script's conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the script should activate.
    pub activate: bool,
    /// The tier that decided.
    pub resolved_by: Resolution,
}

impl Verdict {
    pub(crate) fn new(activate: bool, resolved_by: Resolution) -> Self {
        Self {
            activate,
            resolved_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        admin: bool,
        specific: Option<bool>,
        global: Option<bool>,
        seen: RwLock<Vec<(String, bool)>>,
    }

    impl Ctx {
        fn new(admin: bool) -> Self {
            Self {
                admin,
                specific: None,
                global: None,
                seen: RwLock::new(Vec::new()),
            }
        }
    }

    impl RequestContext for Ctx {
        fn is_administrative(&self) -> bool {
            self.admin
        }

        fn apply_filter(&self, name: &str, value: bool, _handle: &str) -> bool {
            self.seen.write().push((name.to_string(), value));
            let replacement = if name == GLOBAL_CONDITIONAL_FILTER {
                self.global
            } else {
                self.specific
            };
            replacement.unwrap_or(value)
        }
    }

    #[test]
    fn default_is_true_outside_admin() {
        assert!(default_conditional("a", &Ctx::new(false)));
        assert!(!default_conditional("a", &Ctx::new(true)));
    }

    #[test]
    fn specific_filter_runs_before_global() {
        let ctx = Ctx {
            specific: Some(false),
            ..Ctx::new(false)
        };
        assert!(!default_conditional("widget-js", &ctx));
        assert_eq!(
            *ctx.seen.read(),
            vec![
                ("script.conditional.widget-js".to_string(), true),
                ("script.conditional".to_string(), false),
            ]
        );
    }

    #[test]
    fn global_filter_wraps_specific() {
        let ctx = Ctx {
            specific: Some(false),
            global: Some(true),
            ..Ctx::new(true)
        };
        assert!(default_conditional("a", &ctx));
    }

    #[test]
    fn named_override_resolves_through_table() {
        let table = PredicateTable::new();
        let named = ConditionalOverride::named("never");
        assert!(named.resolve(&table).is_none());

        table.register("never", |_| Ok(false));
        let predicate = named.resolve(&table).unwrap();
        assert!(!predicate(&Ctx::new(false)).unwrap());

        assert!(table.remove("never"));
        assert!(!table.contains("never"));
    }

    #[test]
    fn predicate_override_always_resolves() {
        let table = PredicateTable::new();
        let predicate = ConditionalOverride::predicate(|ctx| Ok(ctx.is_administrative()));
        let resolved = predicate.resolve(&table).unwrap();
        assert!(resolved(&Ctx::new(true)).unwrap());
        assert_eq!(format!("{predicate:?}"), "Predicate(..)");
    }
}
