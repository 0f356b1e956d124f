//! Fixed in-sandbox runtime bundles.
//!
//! Synthesized documents never carry generated code. They embed these
//! scripts verbatim and pass per-document data through a single JSON
//! config object (`window.__WC__`) that the bundles read on startup.

/// Version stamped into every synthesized document as
/// `<meta name="wc-runtime" content="...">`.
pub const RUNTIME_VERSION: &str = concat!("page-canvas/", env!("CARGO_PKG_VERSION"));

/// Guide helpers, snap search, position reapply, selection highlight, the
/// global error forwarder and the `PAGE_ENTER` load hook.
///
/// Exposes `window.WC_GUIDE_API` for the drag shim.
pub const BOOTSTRAP_JS: &str = include_str!("../runtime/bootstrap.js");

/// Pointer-driven drag shim. Design mode only; guarded against double install.
pub const DRAG_JS: &str = include_str!("../runtime/drag.js");

/// `goToPage` / `redirectToPage` shim routing in-page navigation through the
/// bridge. Run mode only.
pub const NAV_JS: &str = include_str!("../runtime/nav.js");

/// One of the fixed runtime bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bundle {
    Bootstrap,
    Drag,
    Nav,
}

impl Bundle {
    pub fn name(self) -> &'static str {
        match self {
            Bundle::Bootstrap => "bootstrap",
            Bundle::Drag => "drag",
            Bundle::Nav => "nav",
        }
    }

    /// The embedded script.
    pub fn source(self) -> &'static str {
        match self {
            Bundle::Bootstrap => BOOTSTRAP_JS,
            Bundle::Drag => DRAG_JS,
            Bundle::Nav => NAV_JS,
        }
    }
}

/// Which bundles a document in the given mode receives, in injection order.
///
/// [`synthesize`](crate::synth::synthesize) injects exactly these. A host
/// supplied drag script takes the place of [`Bundle::Drag`].
pub fn bundles_for(is_running: bool, enable_drag: bool) -> Vec<Bundle> {
    let mut out = vec![Bundle::Bootstrap];
    if is_running {
        out.push(Bundle::Nav);
    } else if enable_drag {
        out.push(Bundle::Drag);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundles_are_embedded() {
        assert!(BOOTSTRAP_JS.contains("WC_GUIDE_API"));
        assert!(BOOTSTRAP_JS.contains("IFRAME_ERROR"));
        assert!(BOOTSTRAP_JS.contains("PAGE_ENTER"));
        assert!(DRAG_JS.contains("__WC_DRAG_RUNTIME__"));
        assert!(NAV_JS.contains("__WC_NAV_RUNTIME__"));
    }

    #[test]
    fn test_drag_shim_posts_uppercase_tags() {
        assert!(DRAG_JS.contains("\"SELECT_BLOCK\""));
        assert!(DRAG_JS.contains("\"UPDATE_FREE_POSITION\""));
        assert!(DRAG_JS.contains("lostpointercapture"));
    }

    #[test]
    fn test_drag_shim_climbs_out_of_nested_blocks() {
        assert!(DRAG_JS.contains("function dragTargetOf(node)"));
        assert!(DRAG_JS.contains("node = node.parentElement;"));
        assert!(DRAG_JS.contains("var t = dragTargetOf(ev.target);"));
        assert!(!DRAG_JS.contains("closest(\"[data-block-id]\")"));
    }

    #[test]
    fn test_selection_is_recorded_on_window() {
        assert!(BOOTSTRAP_JS.contains("window.__WC_SELECTED_BLOCK_ID__ = el.getAttribute(\"data-block-id\")"));
    }

    #[test]
    fn test_bundles_never_close_their_script_tag() {
        for src in [BOOTSTRAP_JS, DRAG_JS, NAV_JS] {
            assert!(!src.to_ascii_lowercase().contains("</script"));
        }
    }

    #[test]
    fn test_bundles_for_mode() {
        let names = |v: Vec<Bundle>| v.into_iter().map(Bundle::name).collect::<Vec<_>>();
        assert_eq!(names(bundles_for(false, true)), vec!["bootstrap", "drag"]);
        assert_eq!(names(bundles_for(false, false)), vec!["bootstrap"]);
        assert_eq!(names(bundles_for(true, true)), vec!["bootstrap", "nav"]);
    }

    #[test]
    fn test_bundle_sources() {
        assert_eq!(Bundle::Bootstrap.source(), BOOTSTRAP_JS);
        assert_eq!(Bundle::Drag.source(), DRAG_JS);
        assert_eq!(Bundle::Nav.source(), NAV_JS);
    }

    #[test]
    fn test_version_names_crate() {
        assert!(RUNTIME_VERSION.starts_with("page-canvas/"));
    }
}
