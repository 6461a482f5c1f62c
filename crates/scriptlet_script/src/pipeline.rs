//! The activation pipeline.
//!
//! Runs on the render phase, gated by the conditional:
//!
//! 1. Evaluate. A false verdict stops here with no host calls.
//! 2. Register, if the host has not seen the script yet.
//! 3. Activate.
//! 4. Attach the inline payload, once per process. The flag is claimed before
//!    the host call, so a run that re-enters meanwhile skips the payload.
//! 5. Attach the localization pair when both halves are present. Not guarded;
//!    the host overwrites on every call.

use scriptlet_host::contract::HostServices;

use crate::error::ScriptError;
use crate::instance::ScriptInstance;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The conditional said no.
    Skipped,
    /// The script was activated.
    Activated {
        /// The inline payload was attached by this run.
        inline_attached: bool,
        /// Localized data was attached by this run.
        localized: bool,
    },
}

impl Activation {
    /// Returns true for [`Activation::Activated`].
    #[must_use]
    pub fn is_activated(self) -> bool {
        matches!(self, Self::Activated { .. })
    }
}

impl ScriptInstance {
    /// Runs the activation pipeline against `host`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Evaluation`] if the conditional fails and
    /// [`ScriptError::HostIntegration`] if any host call fails. Nothing is
    /// retried.
    pub fn activate(&self, host: &dyn HostServices) -> Result<Activation, ScriptError> {
        let handle = self.handle();
        let verdict = self.evaluate(host)?;
        if !verdict.activate {
            tracing::debug!(handle = %handle, resolved_by = ?verdict.resolved_by, "script skipped");
            return Ok(Activation::Skipped);
        }

        self.register(host)?;
        host.activate_script(handle)?;

        let inline_attached = self.attach_inline_once(host)?;
        let localized = self.attach_localization(host)?;

        tracing::info!(
            handle = %handle,
            resolved_by = ?verdict.resolved_by,
            inline_attached,
            localized,
            "script activated"
        );
        Ok(Activation::Activated {
            inline_attached,
            localized,
        })
    }

    fn attach_inline_once(&self, host: &dyn HostServices) -> Result<bool, ScriptError> {
        let descriptor = self.descriptor();
        let Some(code) = descriptor.inline().filter(|code| !code.is_empty()) else {
            return Ok(false);
        };
        if !descriptor.claim_inline_attachment() {
            return Ok(false);
        }

        // A refused payload releases the claim so a later run can retry.
        if let Err(err) = host.attach_inline(descriptor.handle(), &code) {
            descriptor.release_inline_attachment();
            return Err(err.into());
        }
        Ok(true)
    }

    fn attach_localization(&self, host: &dyn HostServices) -> Result<bool, ScriptError> {
        let descriptor = self.descriptor();
        let Some(localization) = descriptor.localization().filter(|l| l.is_present()) else {
            return Ok(false);
        };

        host.attach_localized_data(descriptor.handle(), &localization.name, &localization.data)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use scriptlet_host::host::Host;
    use scriptlet_host::table::HostCall;
    use serde_json::json;

    use crate::conditional::{ConditionalOverride, PredicateTable};
    use crate::descriptor::{ScriptArgs, ScriptDescriptor};
    use crate::script::Script;

    const MANIFEST: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");

    struct Widget;

    impl Script for Widget {
        fn args(&self) -> ScriptArgs {
            ScriptArgs::new()
                .handle("widget-js")
                .source("/widget.js")
                .file(MANIFEST)
        }
    }

    fn widget(args: ScriptArgs) -> ScriptInstance {
        let descriptor = ScriptDescriptor::new(args).unwrap();
        ScriptInstance::new(Widget, descriptor, Arc::new(PredicateTable::new()))
    }

    #[test]
    fn skipped_run_makes_no_host_calls() {
        let host = Host::administrative();
        let instance = widget(Widget.args().inline("boot();"));

        assert_eq!(instance.activate(&host).unwrap(), Activation::Skipped);
        assert!(host.scripts().calls().is_empty());
        assert!(!instance.descriptor().is_registered());
    }

    #[test]
    fn registers_before_activating() {
        let host = Host::new();
        let instance = widget(Widget.args());

        let outcome = instance.activate(&host).unwrap();

        assert_eq!(
            outcome,
            Activation::Activated {
                inline_attached: false,
                localized: false
            }
        );
        let calls = host.scripts().calls();
        assert!(matches!(calls[0], HostCall::Register(_)));
        assert_eq!(calls[1], HostCall::Activate("widget-js".into()));
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn inline_payload_attaches_once() {
        let host = Host::new();
        let instance = widget(Widget.args().inline("boot();"));

        assert!(matches!(
            instance.activate(&host).unwrap(),
            Activation::Activated { inline_attached: true, .. }
        ));
        assert!(matches!(
            instance.activate(&host).unwrap(),
            Activation::Activated { inline_attached: false, .. }
        ));
        assert!(instance.descriptor().inline_attached());
        assert_eq!(host.scripts().inline_for("widget-js"), vec!["boot();".to_string()]);
    }

    #[test]
    fn empty_inline_payload_is_not_attached() {
        let host = Host::new();
        let instance = widget(Widget.args().inline(""));

        instance.activate(&host).unwrap();
        assert!(!instance.descriptor().inline_attached());
        assert!(host.scripts().inline_for("widget-js").is_empty());
    }

    #[test]
    fn localization_reattaches_every_run() {
        let host = Host::new();
        let data = json!({ "count": 3 }).as_object().cloned().unwrap();
        let instance = widget(Widget.args().localization("widgetData", data.clone()));

        instance.activate(&host).unwrap();
        instance.activate(&host).unwrap();

        let attaches = host
            .scripts()
            .calls()
            .into_iter()
            .filter(|call| matches!(call, HostCall::AttachLocalized { .. }))
            .count();
        assert_eq!(attaches, 2);
        assert_eq!(host.scripts().localized("widget-js", "widgetData"), Some(data));
    }

    #[test]
    fn half_localization_is_not_attached() {
        let host = Host::new();
        let instance = widget(Widget.args().localization("widgetData", Default::default()));

        let outcome = instance.activate(&host).unwrap();
        assert!(matches!(outcome, Activation::Activated { localized: false, .. }));
    }

    #[test]
    fn override_false_blocks_activation() {
        let host = Host::new();
        let instance = widget(Widget.args());
        instance
            .descriptor()
            .set_conditional(ConditionalOverride::predicate(|_| Ok(false)));

        assert!(!instance.activate(&host).unwrap().is_activated());
        assert!(!host.scripts().is_active("widget-js"));
    }
}
