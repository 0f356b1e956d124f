//! Level 5: Document Synthesis Tests
//!
//! Tests the structure of synthesized preview documents in design and run
//! mode, style sanitization, position overrides and runtime bundle wiring.

mod common;

use common::harness::SessionHarness;
use page_canvas::runtime::{BOOTSTRAP_JS, DRAG_JS, NAV_JS};
use page_canvas::{synthesize, BlockPosition, BridgeMessage, PositionMap, SurfaceConfig, RUNTIME_VERSION};
use pretty_assertions::assert_eq;

fn index_of(doc: &str, needle: &str) -> usize {
    doc.find(needle).unwrap_or_else(|| panic!("missing {needle:?}"))
}

#[test]
fn test_document_skeleton_order() {
    let doc = synthesize(&SurfaceConfig {
        structure_html: "<main id=\"content\"></main>".into(),
        style_raw: "<style>.x{color:red}</style>".into(),
        animation_keyframes: "@keyframes spin { to { transform: rotate(1turn); } }".into(),
        ..Default::default()
    });

    let order = [
        "<!DOCTYPE html>",
        "<meta charset=\"utf-8\">",
        "name=\"wc-runtime\"",
        "#wrapper {",
        "<style id=\"anim-defs\">@keyframes spin",
        "body.is-design *",
        "<style>.x{color:red}</style>",
        "</head>",
        "<div id=\"wrapper\"><main id=\"content\"></main>",
        "<div id=\"wcGuideV\"",
        "<div id=\"wcGuideH\"",
        "window.__WC__ = ",
        "WC_GUIDE_API",
        "__WC_DRAG_RUNTIME__",
        "</body></html>",
    ];
    let positions: Vec<usize> = order.iter().map(|n| index_of(&doc, n)).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn test_runtime_version_meta() {
    let doc = synthesize(&SurfaceConfig::default());
    assert!(doc.contains(&format!("<meta name=\"wc-runtime\" content=\"{RUNTIME_VERSION}\">")));
}

#[test]
fn test_style_input_sanitized() {
    let doc = synthesize(&SurfaceConfig {
        style_raw: "body{} <script>alert(1)</script><style>.ok{}</style><link rel=x>".into(),
        ..Default::default()
    });
    assert!(doc.contains("<style>.ok{}</style>"));
    assert!(!doc.contains("alert(1)"));
    assert!(!doc.contains("<link rel=x>"));
}

#[test]
fn test_design_mode_bundles() {
    let doc = synthesize(&SurfaceConfig {
        logic_js: "document.title = 'user logic';".into(),
        ..Default::default()
    });
    assert!(doc.contains(BOOTSTRAP_JS));
    assert!(doc.contains(DRAG_JS));
    assert!(!doc.contains(NAV_JS));
    assert!(!doc.contains("user logic"));
    assert!(doc.contains("window.__WC_IS_RUNNING__ = false;"));
}

#[test]
fn test_run_mode_bundles() {
    let doc = synthesize(&SurfaceConfig {
        is_running: true,
        logic_js: "document.title = 'user logic';".into(),
        value_runtime_js: "window.WC_VALUES = {};".into(),
        ..Default::default()
    });
    assert!(doc.contains(BOOTSTRAP_JS));
    assert!(doc.contains(NAV_JS));
    assert!(!doc.contains(DRAG_JS));
    assert!(doc.contains("<script>document.title = 'user logic';</script>"));
    assert!(doc.contains("<script>window.WC_VALUES = {};</script>"));
    assert!(index_of(&doc, NAV_JS) < index_of(&doc, "user logic"));
}

#[test]
fn test_positions_css_and_runtime_data() {
    let mut positions = PositionMap::new();
    positions.commit(&BlockPosition { block_id: "hero".into(), x: 120, y: 48 });
    positions.commit(&BlockPosition { block_id: "odd\"id".into(), x: 1, y: 2 });

    let doc = synthesize(&SurfaceConfig { positions_map: positions, ..Default::default() });
    assert!(doc.contains("[data-block-id=\"hero\"] { position: absolute !important; left: 120px !important; top: 48px !important;"));
    assert!(doc.contains(r#"[data-block-id="odd\"id"]"#));
    assert!(doc.contains(r#""positions":{"hero":{"x":120,"y":48},"odd\"id":{"x":1,"y":2}}"#));
}

#[test]
fn test_host_renders_with_committed_positions() {
    let mut h = SessionHarness::new();
    let id = h.page("Home");
    h.send(&BridgeMessage::Navigate { page_id: id.clone() });

    h.add_block("hero", 0.0, 0.0, 100.0, 100.0);
    h.drag_block("hero", (0.0, 0.0), &[(64.0, 256.0)]);

    // Next display picks up the committed position
    h.send(&BridgeMessage::Navigate { page_id: id.clone() });
    let doc = h.tracker.last_displayed().unwrap();
    assert!(doc.contains("left: 64px !important; top: 256px !important;"));
    assert!(doc.contains(&format!(r#""pageId":"{id}""#)));
    assert!(doc.contains(r#""pageRoute":"/home""#));
}

#[test]
fn test_host_run_mode_config() {
    let h = SessionHarness::with_config(SurfaceConfig {
        is_running: true,
        ..Default::default()
    });
    let id = h.page("Shop");
    h.send(&BridgeMessage::Navigate { page_id: id });

    let doc = h.tracker.last_displayed().unwrap();
    assert!(doc.contains("<body class=\"is-running is-pc-mode\">"));
    assert!(doc.contains("__WC_NAV_RUNTIME__"));
}
