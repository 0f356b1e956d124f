//! Surface document synthesis.
//!
//! [`synthesize`] turns a [`SurfaceConfig`] into one self-contained HTML
//! document for the sandboxed preview. The output is deterministic for a
//! given config: every script it carries comes from the fixed bundles in
//! [`crate::runtime`], and per-document data travels as one JSON object.
//!
//! Mode rules:
//!
//! - **Design** (`is_running = false`): animations and transitions are
//!   disabled, the drag shim and selection highlight are installed, and user
//!   logic is dropped.
//! - **Run** (`is_running = true`): auth, value and user logic scripts are
//!   injected along with the navigation shim. No drag shim.
//!
//! Both modes get the bootstrap, which reapplies committed positions on load,
//! forwards uncaught errors as `IFRAME_ERROR` and announces `PAGE_ENTER`.

use crate::config::EditorSettings;
use crate::positions::PositionMap;
use crate::runtime::{self, Bundle, RUNTIME_VERSION};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::OnceLock;

/// Everything the host supplies to build one preview document.
///
/// Field names deserialize from the camelCase option names hosts already
/// send (`structureHtml`, `positionsMap`, `isRunning`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceConfig {
    pub structure_html: String,
    /// Raw style input. Only complete `<style>` blocks survive.
    pub style_raw: String,
    pub positions_map: PositionMap,
    pub is_running: bool,

    pub web_id: String,
    pub page_id: String,
    pub page_route: String,
    pub scale_ratio: f64,

    pub animation_keyframes: String,
    pub auth_runtime_js: String,
    pub value_runtime_js: String,
    pub logic_js: String,

    pub enable_drag: bool,
    /// Replacement drag shim. `None` or blank uses the bundled one.
    pub drag_runtime_js: Option<String>,
    pub enable_snap: bool,

    pub settings: EditorSettings,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            structure_html: String::new(),
            style_raw: String::new(),
            positions_map: PositionMap::new(),
            is_running: false,
            web_id: String::new(),
            page_id: String::new(),
            page_route: String::new(),
            scale_ratio: 1.0,
            animation_keyframes: String::new(),
            auth_runtime_js: String::new(),
            value_runtime_js: String::new(),
            logic_js: String::new(),
            enable_drag: true,
            drag_runtime_js: None,
            enable_snap: true,
            settings: EditorSettings::default(),
        }
    }
}

impl SurfaceConfig {
    /// Scale ratio with non-finite and non-positive values replaced by 1.
    pub fn effective_scale(&self) -> f64 {
        if self.scale_ratio.is_finite() && self.scale_ratio > 0.0 {
            self.scale_ratio
        } else {
            1.0
        }
    }

    fn snap_active(&self) -> bool {
        self.enable_snap && self.settings.snap_enabled
    }
}

/// Data handed to the runtime bundles as `window.__WC__`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfig<'a> {
    positions: &'a PositionMap,
    is_running: bool,
    scale: f64,
    web_id: &'a str,
    page_id: &'a str,
    page_route: &'a str,
    enable_snap: bool,
    snap_threshold: f64,
    auto_scroll_edge: f64,
    auto_scroll_speed: f64,
}

const BASE_CSS: &[&str] = &[
    "html, body { margin:0; padding:0; width:100%; height:100%; overflow-y:auto; overflow-x:hidden; background:#fff; }",
    "* { box-sizing: border-box; }",
    "#wrapper { width:100%; min-height:100vh; position:relative; background:#fff; }",
    "#wrapper > [data-draggable=\"true\"][data-block-id] { position:absolute; left:0; top:0; transform:none; touch-action:none; user-select:none; -webkit-user-select:none; cursor:grab; }",
    ".wc-highlight { outline:2px solid #ff4081 !important; box-shadow:0 0 0 2px #ff4081 !important; z-index: 2147483647 !important; }",
    "#wrapper > [data-draggable=\"true\"][data-block-id].wc-highlight { position:absolute !important; }",
    "[data-wc-block] { position: relative; min-width: 50px; min-height: 50px; }",
    ".wc-guide-line { position:absolute; z-index: 10000; pointer-events:none; display:none; border-color: rgba(255, 0, 0, 0.75); border-style: dashed; }",
    ".wc-guide-v { width:0; border-left-width:1px; }",
    ".wc-guide-h { height:0; border-top-width:1px; }",
];

const DESIGN_FREEZE_CSS: &str =
    "<style>body.is-design * { animation: none !important; transition: none !important; }</style>";

/// Build the complete preview document for `config`.
pub fn synthesize(config: &SurfaceConfig) -> String {
    let mut doc = String::with_capacity(
        config.structure_html.len() + config.style_raw.len() + runtime::BOOTSTRAP_JS.len() + 4096,
    );

    doc.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    let _ = write!(doc, "<meta name=\"wc-runtime\" content=\"{RUNTIME_VERSION}\">");

    doc.push_str("<style>");
    for rule in BASE_CSS {
        doc.push_str(rule);
        doc.push('\n');
    }
    doc.push_str(&position_css(&config.positions_map));
    doc.push_str("</style>");

    if !config.animation_keyframes.is_empty() {
        let _ = write!(
            doc,
            "<style id=\"anim-defs\">{}</style>",
            config.animation_keyframes
        );
    }
    doc.push_str(DESIGN_FREEZE_CSS);
    doc.push_str(&extract_style_tags(&config.style_raw));
    doc.push_str("</head>");

    let mode = if config.is_running { "is-running" } else { "is-design" };
    let _ = write!(doc, "<body class=\"{mode} is-pc-mode\">");
    doc.push_str("<div id=\"wrapper\">");
    doc.push_str(&config.structure_html);
    doc.push_str("<div id=\"wcGuideV\" class=\"wc-guide-line wc-guide-v\"></div>");
    doc.push_str("<div id=\"wcGuideH\" class=\"wc-guide-line wc-guide-h\"></div>");
    doc.push_str("</div>");

    push_script(&mut doc, &config_script(config));
    for bundle in runtime::bundles_for(config.is_running, config.enable_drag) {
        match bundle {
            Bundle::Bootstrap => push_script(&mut doc, bundle.source()),
            Bundle::Nav => {
                // Page runtimes load ahead of the nav shim.
                push_script_if_present(&mut doc, &config.auth_runtime_js);
                push_script_if_present(&mut doc, &config.value_runtime_js);
                push_script(&mut doc, bundle.source());
            }
            Bundle::Drag => match config.drag_runtime_js.as_deref() {
                Some(custom) if !custom.trim().is_empty() => push_script(&mut doc, custom),
                _ => push_script(&mut doc, bundle.source()),
            },
        }
    }
    if config.is_running {
        doc.push_str(&wrap_logic(&config.logic_js));
    }

    doc.push_str("</body></html>");
    doc
}

/// Keep only complete `<style>...</style>` blocks from `raw`, newline-joined.
pub fn extract_style_tags(raw: &str) -> String {
    static STYLE_TAG: OnceLock<Regex> = OnceLock::new();
    let re = STYLE_TAG.get_or_init(|| {
        Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("style tag regex")
    });

    re.find_iter(raw)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// CSS rules pinning each committed block to its position.
pub fn position_css(positions: &PositionMap) -> String {
    let mut css = String::with_capacity(positions.len() * 160);
    for (block_id, p) in positions.iter() {
        let _ = writeln!(
            css,
            "[data-block-id=\"{}\"] {{ position: absolute !important; left: {}px !important; top: {}px !important; transform: none !important; z-index: 100; }}",
            escape_css_string(block_id),
            p.x,
            p.y
        );
    }
    css
}

/// Escape a value for use inside a double-quoted CSS string.
pub fn escape_css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            // `<` would let `</style>` close the block early
            '<' => out.push_str("\\3c "),
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            c if c.is_control() => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Serialize `value` as JSON that is safe to embed in a `<script>` body.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

fn config_script(config: &SurfaceConfig) -> String {
    let data = RuntimeConfig {
        positions: &config.positions_map,
        is_running: config.is_running,
        scale: config.effective_scale(),
        web_id: &config.web_id,
        page_id: &config.page_id,
        page_route: &config.page_route,
        enable_snap: config.snap_active(),
        snap_threshold: config.settings.snap_threshold,
        auto_scroll_edge: config.settings.auto_scroll_edge,
        auto_scroll_speed: config.settings.auto_scroll_speed,
    };
    format!(
        "window.__WC__ = {};\nwindow.WC_WEB_ID = {};\nwindow.__WC_IS_RUNNING__ = {};\nwindow.WC_ENABLE_SNAP = {};\nwindow.WC_SCALE = {};",
        script_json(&data),
        script_json(&config.web_id),
        config.is_running,
        config.snap_active(),
        config.effective_scale()
    )
}

/// User logic as a script element. Already-wrapped input passes through.
fn wrap_logic(logic: &str) -> String {
    if logic.trim().is_empty() {
        return String::new();
    }
    if logic.contains("<script") {
        return logic.to_string();
    }
    format!("<script>{logic}</script>")
}

fn push_script(doc: &mut String, body: &str) {
    doc.push_str("<script>");
    doc.push_str(body);
    doc.push_str("</script>");
}

fn push_script_if_present(doc: &mut String, body: &str) {
    if !body.trim().is_empty() {
        push_script(doc, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::BlockPosition;
    use pretty_assertions::assert_eq;

    fn positions(entries: &[(&str, u32, u32)]) -> PositionMap {
        let mut map = PositionMap::new();
        for (id, x, y) in entries {
            map.commit(&BlockPosition { block_id: id.to_string(), x: *x, y: *y });
        }
        map
    }

    // ========================================================================
    // Style extraction
    // ========================================================================

    #[test]
    fn test_extract_style_tags_drops_other_markup() {
        let raw = "<link rel=stylesheet href=x><style>a{}</style><script>evil()</script><STYLE media=print>b{}</STYLE>";
        assert_eq!(
            extract_style_tags(raw),
            "<style>a{}</style>\n<STYLE media=print>b{}</STYLE>"
        );
    }

    #[test]
    fn test_extract_style_tags_multiline_and_empty() {
        assert_eq!(extract_style_tags("<style>\n.a{\n}\n</style>"), "<style>\n.a{\n}\n</style>");
        assert_eq!(extract_style_tags(""), "");
        assert_eq!(extract_style_tags("<style>unterminated"), "");
    }

    // ========================================================================
    // Position CSS and escaping
    // ========================================================================

    #[test]
    fn test_position_css_rule() {
        let css = position_css(&positions(&[("hero", 12, 34)]));
        assert!(css.starts_with("[data-block-id=\"hero\"] {"));
        assert!(css.contains("left: 12px !important"));
        assert!(css.contains("top: 34px !important"));
    }

    #[test]
    fn test_escape_css_string() {
        assert_eq!(escape_css_string(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_css_string("x</style>"), "x\\3c /style>");
    }

    #[test]
    fn test_script_json_escapes_closing_tags() {
        assert_eq!(script_json("</script>"), r#""<\/script>""#);
    }

    // ========================================================================
    // Mode rules
    // ========================================================================

    #[test]
    fn test_design_mode_document() {
        let config = SurfaceConfig {
            structure_html: "<div data-block-id=\"a\" data-draggable=\"true\"></div>".into(),
            logic_js: "window.USER_LOGIC = 1;".into(),
            ..Default::default()
        };
        let doc = synthesize(&config);

        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<body class=\"is-design is-pc-mode\">"));
        assert!(doc.contains("animation: none !important"));
        assert!(doc.contains("__WC_DRAG_RUNTIME__"));
        assert!(!doc.contains("USER_LOGIC"));
        assert!(!doc.contains("__WC_NAV_RUNTIME__"));
        assert!(doc.ends_with("</body></html>"));
    }

    #[test]
    fn test_run_mode_document() {
        let config = SurfaceConfig {
            is_running: true,
            logic_js: "window.USER_LOGIC = 1;".into(),
            auth_runtime_js: "window.AUTH = 1;".into(),
            ..Default::default()
        };
        let doc = synthesize(&config);

        assert!(doc.contains("<body class=\"is-running is-pc-mode\">"));
        assert!(doc.contains("<script>window.USER_LOGIC = 1;</script>"));
        assert!(doc.contains("<script>window.AUTH = 1;</script>"));
        assert!(doc.contains("__WC_NAV_RUNTIME__"));
        assert!(!doc.contains("__WC_DRAG_RUNTIME__"));
    }

    #[test]
    fn test_auth_and_value_runtimes_skipped_in_design() {
        let config = SurfaceConfig {
            auth_runtime_js: "window.AUTH = 1;".into(),
            value_runtime_js: "window.VALUES = 1;".into(),
            ..Default::default()
        };
        let doc = synthesize(&config);
        assert!(!doc.contains("window.AUTH"));
        assert!(!doc.contains("window.VALUES"));
    }

    #[test]
    fn test_prewrapped_logic_passes_through() {
        let config = SurfaceConfig {
            is_running: true,
            logic_js: "<script src=\"app.js\"></script>".into(),
            ..Default::default()
        };
        let doc = synthesize(&config);
        assert!(doc.contains("<script src=\"app.js\"></script>"));
        assert!(!doc.contains("<script><script"));
    }

    #[test]
    fn test_custom_and_disabled_drag_shim() {
        let custom = SurfaceConfig {
            drag_runtime_js: Some("window.CUSTOM_DRAG = 1;".into()),
            ..Default::default()
        };
        let doc = synthesize(&custom);
        assert!(doc.contains("window.CUSTOM_DRAG = 1;"));
        assert!(!doc.contains("__WC_DRAG_RUNTIME__"));

        let off = SurfaceConfig { enable_drag: false, ..Default::default() };
        assert!(!synthesize(&off).contains("__WC_DRAG_RUNTIME__"));
    }

    #[test]
    fn test_document_carries_exactly_the_mode_bundles_in_order() {
        let all = [Bundle::Bootstrap, Bundle::Drag, Bundle::Nav];
        for (is_running, enable_drag) in [(false, true), (false, false), (true, true), (true, false)] {
            let doc = synthesize(&SurfaceConfig { is_running, enable_drag, ..Default::default() });
            let expected = runtime::bundles_for(is_running, enable_drag);

            let offsets: Vec<usize> = expected
                .iter()
                .map(|b| doc.find(b.source()).unwrap_or_else(|| panic!("{} missing", b.name())))
                .collect();
            assert!(offsets.windows(2).all(|w| w[0] < w[1]));

            for bundle in all.iter().filter(|b| !expected.contains(*b)) {
                assert!(!doc.contains(bundle.source()), "{} injected", bundle.name());
            }
        }
    }

    #[test]
    fn test_bootstrap_present_in_both_modes() {
        for is_running in [false, true] {
            let doc = synthesize(&SurfaceConfig { is_running, ..Default::default() });
            assert!(doc.contains("IFRAME_ERROR"));
            assert!(doc.contains("PAGE_ENTER"));
            assert!(doc.contains("WC_GUIDE_API"));
            assert!(doc.contains("name=\"wc-runtime\""));
        }
    }

    // ========================================================================
    // Runtime config
    // ========================================================================

    #[test]
    fn test_positions_emitted_as_css_and_json() {
        let config = SurfaceConfig {
            positions_map: positions(&[("b1", 40, 80)]),
            ..Default::default()
        };
        let doc = synthesize(&config);
        assert!(doc.contains("[data-block-id=\"b1\"]"));
        assert!(doc.contains(r#""positions":{"b1":{"x":40,"y":80}}"#));
    }

    #[test]
    fn test_settings_forwarded_and_snap_gated() {
        let mut config = SurfaceConfig::default();
        config.settings.snap_threshold = 9.0;
        config.settings.snap_enabled = false;
        let doc = synthesize(&config);
        assert!(doc.contains(r#""snapThreshold":9.0"#));
        assert!(doc.contains(r#""enableSnap":false"#));
        assert!(doc.contains("window.WC_ENABLE_SNAP = false;"));
    }

    #[test]
    fn test_page_id_cannot_break_out_of_script() {
        let config = SurfaceConfig {
            page_id: "</script><script>alert(1)".into(),
            ..Default::default()
        };
        let doc = synthesize(&config);
        assert!(!doc.contains("</script><script>alert(1)"));
        assert!(doc.contains(r#"<\/script><script>alert(1)"#));
    }

    #[test]
    fn test_scale_ratio_sanitized() {
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let config = SurfaceConfig { scale_ratio: bad, ..Default::default() };
            assert_eq!(config.effective_scale(), 1.0);
        }
        let ok = SurfaceConfig { scale_ratio: 0.5, ..Default::default() };
        assert!(synthesize(&ok).contains("window.WC_SCALE = 0.5;"));
    }

    #[test]
    fn test_config_from_camel_case_json() {
        let config: SurfaceConfig = serde_json::from_str(
            r#"{"structureHtml":"<p></p>","isRunning":true,"pageId":"page_1","positionsMap":{"a":{"x":1,"y":2}}}"#,
        )
        .unwrap();
        assert!(config.is_running);
        assert!(config.enable_drag);
        assert_eq!(config.scale_ratio, 1.0);
        assert_eq!(config.page_id, "page_1");
        assert_eq!(config.positions_map.len(), 1);
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let config = SurfaceConfig {
            positions_map: positions(&[("a", 1, 1), ("b", 2, 2)]),
            ..Default::default()
        };
        assert_eq!(synthesize(&config), synthesize(&config));
    }
}
