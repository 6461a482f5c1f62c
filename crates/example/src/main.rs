//! Simulates one host request with two scripts.
//!
//! The widget is constructed before the host starts its phases; the
//! analytics script only after `init` has fired, so its registration runs
//! immediately while activation still waits for `render`.
//!
//! # Usage
//!
//! ```bash
//! render-request [config.json] [--admin]
//! ```

use std::process::ExitCode;

use example::{AnalyticsScript, WidgetScript};
use scriptlet_core::ScriptletConfig;
use scriptlet_host::host::Host;
use scriptlet_host::phase::{OnInit, OnLoad, OnRender};
use scriptlet_host::table::HostCall;
use scriptlet_script::error::ScriptError;
use serde_json::json;

fn run(config: &ScriptletConfig, administrative: bool) -> Result<Host, ScriptError> {
    let host = if administrative {
        Host::administrative()
    } else {
        Host::new()
    };
    let registry = config.registry();

    let widget = registry.instance::<WidgetScript>(&host)?;
    if let Some(data) = json!({ "count": 3 }).as_object() {
        widget.descriptor().set_localization("widgetData", data.clone());
    }

    host.run_phases::<(OnLoad, OnInit)>();
    registry.instance::<AnalyticsScript>(&host)?;

    let render = host.fire::<OnRender>();
    for failure in &render.failures {
        tracing::error!(
            script = failure.label.as_deref().unwrap_or("-"),
            priority = failure.priority,
            error = %failure.error,
            "render callback failed"
        );
    }
    Ok(host)
}

#[expect(clippy::print_stdout, reason = "the demo prints the host's call log")]
fn print_calls(host: &Host) {
    for call in host.scripts().calls() {
        match call {
            HostCall::Register(script) => println!(
                "register  {:<14} {} deps={:?} version={} {:?}",
                script.handle,
                script.source,
                script.dependencies,
                script.version.as_deref().unwrap_or("-"),
                script.placement,
            ),
            HostCall::Activate(handle) => println!("activate  {handle}"),
            HostCall::AttachInline { handle, code } => println!("inline    {handle:<14} {code}"),
            HostCall::AttachLocalized { handle, name, data } => {
                println!("localize  {handle:<14} {name} = {}", serde_json::Value::Object(data));
            }
        }
    }
}

#[expect(clippy::print_stderr, reason = "command-line error reporting")]
fn main() -> ExitCode {
    let mut config_path = None;
    let mut administrative = false;
    for arg in std::env::args().skip(1) {
        if arg == "--admin" {
            administrative = true;
        } else {
            config_path = Some(arg);
        }
    }

    let config = match config_path.as_deref().map(ScriptletConfig::from_path) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
        None => ScriptletConfig::default(),
    };

    match config.tracing_setup() {
        Ok(setup) => {
            setup.install();
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    }

    match run(&config, administrative) {
        Ok(host) => {
            print_calls(&host);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
