//! Example scripts for the `render-request` demo.
//!
//! - [`WidgetScript`] uses the default conditional, so it is skipped on
//!   administrative requests unless a filter says otherwise.
//! - [`AnalyticsScript`] only activates on requests the host has not marked
//!   with the `"analytics.opt_out"` filter.

use scriptlet_host::contract::{Placement, RequestContext};
use scriptlet_host::error::BoxError;
use scriptlet_script::descriptor::{ScriptArgs, ScriptDescriptor};
use scriptlet_script::script::Script;

/// Directory holding the demo's script files.
pub const ASSETS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");

/// A counter widget rendered in the page header.
#[derive(Debug, Default)]
pub struct WidgetScript;

impl Script for WidgetScript {
    fn args(&self) -> ScriptArgs {
        ScriptArgs::new()
            .handle("widget-js")
            .source("/assets/widget.js")
            .file(format!("{ASSETS_DIR}/widget.js"))
            .placement(Placement::Header)
            .inline("window.widget.boot();")
    }
}

/// Page view tracking, emitted in the footer after the widget.
#[derive(Debug, Default)]
pub struct AnalyticsScript;

/// Filter the host can use to opt a request out of analytics.
pub const ANALYTICS_OPT_OUT_FILTER: &str = "analytics.opt_out";

impl Script for AnalyticsScript {
    fn args(&self) -> ScriptArgs {
        ScriptArgs::new()
            .handle("analytics-js")
            .source("/assets/analytics.js")
            .file(format!("{ASSETS_DIR}/analytics.js"))
            .dependency("widget-js")
            .priority(30)
    }

    fn conditional(
        &self,
        descriptor: &ScriptDescriptor,
        ctx: &dyn RequestContext,
    ) -> Result<bool, BoxError> {
        let opted_out = ctx.apply_filter(ANALYTICS_OPT_OUT_FILTER, false, descriptor.handle());
        Ok(!opted_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptlet_host::host::Host;
    use scriptlet_script::registry::ScriptRegistry;

    #[test]
    fn assets_exist() {
        let widget = ScriptDescriptor::new(WidgetScript.args()).unwrap();
        let analytics = ScriptDescriptor::new(AnalyticsScript.args()).unwrap();
        assert!(widget.version().is_some());
        assert!(analytics.version().is_some());
    }

    #[test]
    fn analytics_activates_on_admin_requests_unless_opted_out() {
        let host = Host::administrative();
        let registry = ScriptRegistry::new();
        registry.instance::<WidgetScript>(&host).unwrap();
        registry.instance::<AnalyticsScript>(&host).unwrap();

        host.run_request();

        assert!(!host.scripts().is_active("widget-js"));
        assert!(host.scripts().is_active("analytics-js"));
    }

    #[test]
    fn opt_out_filter_suppresses_analytics() {
        let host = Host::new();
        host.filters()
            .add_filter(ANALYTICS_OPT_OUT_FILTER, "dnt", 10, |_, _| true)
            .unwrap();
        let registry = ScriptRegistry::new();
        registry.instance::<AnalyticsScript>(&host).unwrap();

        host.run_request();

        assert!(host.scripts().registered("analytics-js").is_some());
        assert!(!host.scripts().is_active("analytics-js"));
    }
}
