//! Built-in phase markers, in the order the host fires them.

use super::Phase;

/// Early bootstrap. Fires once everything the host loads is in place.
///
/// Scripts bind their remaining phases from here.
pub struct OnLoad;
impl Phase for OnLoad {
    const NAME: &'static str = "load";
}

/// Registration. Scripts declare themselves to the host without activating.
pub struct OnInit;
impl Phase for OnInit {
    const NAME: &'static str = "init";
}

/// Pre-render. Scripts decide whether to activate for the current render.
pub struct OnRender;
impl Phase for OnRender {
    const NAME: &'static str = "render";
}
