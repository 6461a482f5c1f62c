//! Lifecycle binding against the reference host: scripts constructed before,
//! between and after the host phases.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use scriptlet_host::prelude::*;
use scriptlet_script::prelude::*;

// ─────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────

const MANIFEST: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");

#[derive(Default)]
struct Widget;

impl Script for Widget {
    fn args(&self) -> ScriptArgs {
        ScriptArgs::new()
            .handle("widget-js")
            .source("/widget.js")
            .file(MANIFEST)
    }
}

#[derive(Default)]
struct Analytics;

impl Script for Analytics {
    fn args(&self) -> ScriptArgs {
        ScriptArgs::new()
            .handle("analytics-js")
            .source("/analytics.js")
            .file(MANIFEST)
            .priority(5)
    }
}

/// Delegates to [`Host`] but refuses every registration.
#[derive(Default)]
struct RefusingHost {
    inner: Host,
}

impl PhaseHost for RefusingHost {
    fn phase_has_elapsed(&self, phase: PhaseId) -> bool {
        self.inner.phase_has_elapsed(phase)
    }

    fn on_phase(&self, phase: PhaseId, priority: i32, callback: PhaseCallback) {
        self.inner.on_phase(phase, priority, callback);
    }
}

impl ScriptHost for RefusingHost {
    fn register_script(&self, registration: &Registration<'_>) -> Result<(), HostError> {
        Err(HostError::rejected(registration.handle, "registrations are closed"))
    }

    fn activate_script(&self, handle: &str) -> Result<(), HostError> {
        self.inner.activate_script(handle)
    }

    fn attach_inline(&self, handle: &str, code: &str) -> Result<(), HostError> {
        self.inner.attach_inline(handle, code)
    }

    fn attach_localized_data(
        &self,
        handle: &str,
        name: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), HostError> {
        self.inner.attach_localized_data(handle, name, data)
    }
}

impl RequestContext for RefusingHost {
    fn is_administrative(&self) -> bool {
        self.inner.is_administrative()
    }

    fn apply_filter(&self, name: &str, value: bool, handle: &str) -> bool {
        self.inner.apply_filter(name, value, handle)
    }
}

/// Host call that runs the pipeline again from inside itself.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Reentry {
    Register,
    AttachInline,
}

/// Delegates to [`Host`] and re-enters `activate` once from inside `reentry`.
struct ReentrantHost {
    inner: Host,
    reentry: Reentry,
    instance: Mutex<Option<Arc<ScriptInstance>>>,
    nested: Mutex<Vec<Activation>>,
}

impl ReentrantHost {
    fn new(reentry: Reentry) -> Self {
        Self {
            inner: Host::new(),
            reentry,
            instance: Mutex::new(None),
            nested: Mutex::new(Vec::new()),
        }
    }

    fn reenter(&self, at: Reentry) {
        if at != self.reentry {
            return;
        }
        // Take the instance so only the first call re-enters.
        let Some(instance) = self.instance.lock().take() else {
            return;
        };
        let outcome = instance.activate(self).unwrap();
        self.nested.lock().push(outcome);
    }
}

impl PhaseHost for ReentrantHost {
    fn phase_has_elapsed(&self, phase: PhaseId) -> bool {
        self.inner.phase_has_elapsed(phase)
    }

    fn on_phase(&self, phase: PhaseId, priority: i32, callback: PhaseCallback) {
        self.inner.on_phase(phase, priority, callback);
    }
}

impl ScriptHost for ReentrantHost {
    fn register_script(&self, registration: &Registration<'_>) -> Result<(), HostError> {
        self.inner.register_script(registration)?;
        self.reenter(Reentry::Register);
        Ok(())
    }

    fn activate_script(&self, handle: &str) -> Result<(), HostError> {
        self.inner.activate_script(handle)
    }

    fn attach_inline(&self, handle: &str, code: &str) -> Result<(), HostError> {
        self.reenter(Reentry::AttachInline);
        self.inner.attach_inline(handle, code)
    }

    fn attach_localized_data(
        &self,
        handle: &str,
        name: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), HostError> {
        self.inner.attach_localized_data(handle, name, data)
    }
}

impl RequestContext for ReentrantHost {
    fn is_administrative(&self) -> bool {
        self.inner.is_administrative()
    }

    fn apply_filter(&self, name: &str, value: bool, handle: &str) -> bool {
        self.inner.apply_filter(name, value, handle)
    }
}

fn kinds(calls: &[HostCall]) -> Vec<&'static str> {
    calls
        .iter()
        .map(|call| match call {
            HostCall::Register(_) => "register",
            HostCall::Activate(_) => "activate",
            HostCall::AttachInline { .. } => "inline",
            HostCall::AttachLocalized { .. } => "localize",
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────
// Phase timing
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn constructed_before_any_phase_defers_everything() {
    let host = Host::new();
    let registry = ScriptRegistry::new();

    let instance = registry.instance::<Widget>(&host).unwrap();

    assert!(host.scripts().calls().is_empty());
    assert_eq!(host.dispatcher().pending_count(PhaseId::of::<OnLoad>()), 1);
    assert!(!instance.descriptor().is_registered());

    let reports = host.run_request();
    assert!(reports.iter().all(DispatchReport::is_clean));
    assert_eq!(kinds(&host.scripts().calls_for("widget-js")), ["register", "activate"]);
}

#[test]
fn constructed_after_load_binds_init_and_render() {
    let host = Host::new();
    host.fire::<OnLoad>();
    let registry = ScriptRegistry::new();

    registry.instance::<Widget>(&host).unwrap();

    assert!(host.scripts().calls().is_empty());
    assert_eq!(host.dispatcher().pending_count(PhaseId::of::<OnInit>()), 1);
    assert_eq!(host.dispatcher().pending_count(PhaseId::of::<OnRender>()), 1);

    host.fire::<OnInit>();
    assert_eq!(kinds(&host.scripts().calls()), ["register"]);

    host.fire::<OnRender>();
    assert_eq!(kinds(&host.scripts().calls()), ["register", "activate"]);
}

#[test]
fn constructed_after_init_registers_immediately() {
    let host = Host::new();
    host.run_phases::<(OnLoad, OnInit)>();
    let registry = ScriptRegistry::new();

    let instance = registry.instance::<Widget>(&host).unwrap();

    assert!(instance.descriptor().is_registered());
    assert_eq!(kinds(&host.scripts().calls()), ["register"]);

    host.fire::<OnRender>();
    assert!(host.scripts().is_active("widget-js"));
}

#[test]
fn constructed_after_render_runs_everything_now() {
    let host = Host::new();
    host.run_request();
    let registry = ScriptRegistry::new();

    registry.instance::<Widget>(&host).unwrap();

    assert_eq!(kinds(&host.scripts().calls()), ["register", "activate"]);
    for phase in [
        PhaseId::of::<OnLoad>(),
        PhaseId::of::<OnInit>(),
        PhaseId::of::<OnRender>(),
    ] {
        assert_eq!(host.dispatcher().pending_count(phase), 0);
    }
}

#[test]
fn render_without_init_still_registers_first() {
    let host = Host::new();
    host.fire::<OnLoad>();
    let registry = ScriptRegistry::new();
    registry.instance::<Widget>(&host).unwrap();

    host.fire::<OnRender>();

    assert_eq!(kinds(&host.scripts().calls()), ["register", "activate"]);
    let init = host.fire::<OnInit>();
    assert!(init.is_clean());
    assert_eq!(host.scripts().calls().len(), 2);
}

#[test]
fn scripts_run_in_priority_order() {
    let host = Host::new();
    let registry = ScriptRegistry::new();
    registry.instance::<Widget>(&host).unwrap();
    registry.instance::<Analytics>(&host).unwrap();

    host.run_request();

    assert_eq!(host.scripts().active(), ["analytics-js", "widget-js"]);
}

#[test]
fn lifecycle_attaches_once_per_instance() {
    let host = Host::new();
    let registry = ScriptRegistry::new();
    let instance = registry.instance::<Widget>(&host).unwrap();

    assert_eq!(instance.attach_lifecycle(&host).unwrap(), None);
    assert_eq!(host.dispatcher().pending_count(PhaseId::of::<OnLoad>()), 1);
}

// ─────────────────────────────────────────────────────────────────────────
// Host failures
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn immediate_host_failure_surfaces_as_integration_error() {
    let host = RefusingHost::default();
    host.inner.run_request();
    let registry = ScriptRegistry::new();

    let err = registry.instance::<Widget>(&host).unwrap_err();

    assert!(matches!(err, ScriptError::HostIntegration(HostError::Rejected { .. })));
    assert!(registry.contains::<Widget>());
}

#[test]
fn deferred_host_failure_is_isolated_per_script() {
    let host = Host::new();
    let registry = ScriptRegistry::new();
    registry.instance::<Widget>(&host).unwrap();
    registry.instance::<Analytics>(&host).unwrap();
    host.fire::<OnLoad>();

    // Claim the handle so the widget's registration is refused.
    let deps: Vec<String> = Vec::new();
    host.register_script(&Registration {
        handle: "widget-js",
        source: "/elsewhere.js",
        dependencies: &deps,
        version: None,
        placement: Placement::Header,
    })
    .unwrap();

    let init = host.fire::<OnInit>();
    assert_eq!(init.ran, 2);
    assert_eq!(init.failures.len(), 1);
    assert_eq!(init.failures[0].label.as_deref(), Some("widget-js"));
    assert!(host.scripts().registered("analytics-js").is_some());

    let render = host.fire::<OnRender>();
    assert!(host.scripts().is_active("analytics-js"));
    assert_eq!(render.failures.len(), 1);
}

#[test]
fn failing_conditional_is_reported_by_render() {
    let host = Host::new();
    let registry = ScriptRegistry::new();
    let instance = registry.instance::<Widget>(&host).unwrap();
    instance
        .descriptor()
        .set_conditional(ConditionalOverride::predicate(|_| Err("session store down".into())));

    let reports = host.run_request();

    let render = &reports[2];
    assert_eq!(render.failures.len(), 1);
    assert_eq!(render.failures[0].label.as_deref(), Some("widget-js"));
    assert!(render.failures[0].error.to_string().contains("session store down"));
    assert!(!host.scripts().is_active("widget-js"));
    assert!(host.scripts().registered("widget-js").is_some());
}

// ─────────────────────────────────────────────────────────────────────────
// Re-entrance
// ─────────────────────────────────────────────────────────────────────────

fn reentrant_widget(reentry: Reentry) -> (ReentrantHost, Arc<ScriptInstance>) {
    let host = ReentrantHost::new(reentry);
    let registry = ScriptRegistry::new();
    let instance = registry.instance::<Widget>(&host).unwrap();
    instance.descriptor().set_inline("boot();");
    *host.instance.lock() = Some(Arc::clone(&instance));
    (host, instance)
}

fn count(calls: &[HostCall], kind: &str) -> usize {
    kinds(calls).into_iter().filter(|k| *k == kind).count()
}

#[test]
fn reentering_from_attach_inline_attaches_once() {
    let (host, instance) = reentrant_widget(Reentry::AttachInline);

    let outcome = instance.activate(&host).unwrap();

    let calls = host.inner.scripts().calls();
    assert_eq!(count(&calls, "inline"), 1);
    assert_eq!(count(&calls, "register"), 1);
    assert_eq!(host.inner.scripts().inline_for("widget-js"), ["boot();"]);
    assert!(matches!(outcome, Activation::Activated { inline_attached: true, .. }));
    assert!(matches!(
        host.nested.lock()[..],
        [Activation::Activated { inline_attached: false, .. }]
    ));
}

#[test]
fn reentering_from_register_registers_once() {
    let (host, instance) = reentrant_widget(Reentry::Register);

    instance.activate(&host).unwrap();

    let calls = host.inner.scripts().calls();
    assert_eq!(count(&calls, "register"), 1);
    assert_eq!(count(&calls, "inline"), 1);
    assert_eq!(host.nested.lock().len(), 1);
    assert!(instance.descriptor().is_registered());
}

#[test]
fn reentrance_from_phase_dispatch_is_clean() {
    let (host, _instance) = reentrant_widget(Reentry::Register);
    let fire = |phase| host.inner.dispatcher().fire(phase, &host);

    assert!(fire(PhaseId::of::<OnLoad>()).is_clean());
    assert!(fire(PhaseId::of::<OnInit>()).is_clean());
    // Registration at init re-entered the whole pipeline.
    assert!(host.inner.scripts().is_active("widget-js"));

    assert!(fire(PhaseId::of::<OnRender>()).is_clean());
    let calls = host.inner.scripts().calls();
    assert_eq!(count(&calls, "register"), 1);
    assert_eq!(count(&calls, "inline"), 1);
}

// ─────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────

fn lifecycle_phase(index: usize) -> PhaseId {
    [
        PhaseId::of::<OnLoad>(),
        PhaseId::of::<OnInit>(),
        PhaseId::of::<OnRender>(),
    ][index]
}

proptest! {
    #[test]
    fn binding_takes_exactly_one_branch(fired in 0usize..=3, target in 0usize..3, priority in -50i32..50) {
        let host = Host::new();
        for index in 0..fired {
            host.fire_phase(lifecycle_phase(index));
        }
        let phase = lifecycle_phase(target);
        let elapsed = host.phase_has_elapsed(phase);
        let pending_before = host.dispatcher().pending_count(phase);

        let runs = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&runs);
        let binding = bind_or_run_now(&host, phase, priority, move |_| {
            *counter.lock() += 1;
            Ok::<_, ScriptError>(())
        })
        .unwrap();

        let deferred = host.dispatcher().pending_count(phase) == pending_before + 1;
        let ran_now = *runs.lock() == 1;

        prop_assert!(deferred != ran_now);
        prop_assert_eq!(binding == Binding::RanNow, elapsed);
        prop_assert_eq!(ran_now, elapsed);
    }
}
