//! Attribute policy table applied to exported static markup.
//!
//! Bundles of `{target, ops}` describe attribute changes for the elements a
//! target selects. This module owns the table format and the policy of each
//! op ([`AttrOp::edits`]); walking and rewriting the DOM is left to a
//! [`MarkupPostProcessor`] supplied by the caller.

use serde::{Deserialize, Deserializer, Serialize};

/// Ops for the elements matched by `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrBundle {
    pub target: String,
    #[serde(default)]
    pub ops: Vec<AttrOp>,
}

/// Where a text segment goes relative to its base text.
///
/// Decoding is case-insensitive. A missing, null or unrecognized mode means
/// [`SegmentMode::After`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    Before,
    #[default]
    After,
    Replace,
}

impl<'de> Deserialize<'de> for SegmentMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.map(|m| m.to_ascii_lowercase()).as_deref() {
            Some("before") => SegmentMode::Before,
            Some("replace") => SegmentMode::Replace,
            _ => SegmentMode::After,
        })
    }
}

/// One attribute operation, tagged on `t`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum AttrOp {
    Id {
        #[serde(default)]
        v: String,
    },
    ClassAdd {
        #[serde(default)]
        v: String,
    },
    Data {
        #[serde(default)]
        k: String,
        #[serde(default)]
        v: String,
    },
    Aria {
        #[serde(default)]
        k: String,
        #[serde(default)]
        v: String,
    },
    Placeholder {
        #[serde(default)]
        v: String,
    },
    Value {
        #[serde(default)]
        v: String,
    },
    Required,
    Disabled,
    Readonly,
    TargetBlank,
    RelNoopener,
    For {
        #[serde(default)]
        v: String,
    },
    ServerField {
        #[serde(default)]
        v: String,
    },
    DupTarget {
        #[serde(default)]
        v: String,
    },
    Style {
        #[serde(default)]
        v: String,
    },
    TextSegment {
        #[serde(default)]
        base: String,
        #[serde(default)]
        text: String,
        #[serde(default)]
        cls: String,
        #[serde(default)]
        mode: SegmentMode,
    },
    #[serde(other)]
    Unknown,
}

/// A concrete change to one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrEdit {
    /// Set an attribute, replacing any existing value.
    Set { name: String, value: String },
    /// Add classes that are not already present.
    AddClasses(Vec<String>),
    /// Merge `noopener noreferrer` into `rel`; see [`merge_rel`].
    AddRelNoopener,
    /// Append declarations to `style`; see [`merge_style`].
    AppendStyle(String),
    /// Rewrite the element's text; see [`text_segment_html`].
    TextSegment {
        base: String,
        text: String,
        cls: String,
        mode: SegmentMode,
    },
}

fn set(name: impl Into<String>, value: impl Into<String>) -> AttrEdit {
    AttrEdit::Set {
        name: name.into(),
        value: value.into(),
    }
}

impl AttrOp {
    /// The edits this op makes. Ops missing a required value make none.
    pub fn edits(&self) -> Vec<AttrEdit> {
        match self {
            AttrOp::Id { v } if !v.is_empty() => vec![set("id", v)],
            AttrOp::ClassAdd { v } => {
                let classes: Vec<String> = v.split_whitespace().map(str::to_string).collect();
                if classes.is_empty() {
                    vec![]
                } else {
                    vec![AttrEdit::AddClasses(classes)]
                }
            }
            AttrOp::Data { k, v } if !k.is_empty() => vec![set(format!("data-{k}"), v)],
            AttrOp::Aria { k, v } if !k.is_empty() => vec![set(format!("aria-{k}"), v)],
            AttrOp::Placeholder { v } => vec![set("placeholder", v)],
            AttrOp::Value { v } => vec![set("value", v)],
            AttrOp::Required => vec![set("required", "")],
            AttrOp::Disabled => vec![set("disabled", "")],
            AttrOp::Readonly => vec![set("readonly", "")],
            AttrOp::TargetBlank => vec![set("target", "_blank")],
            AttrOp::RelNoopener => vec![AttrEdit::AddRelNoopener],
            AttrOp::For { v } if !v.is_empty() => vec![set("for", v)],
            AttrOp::ServerField { v } if !v.is_empty() => {
                vec![set("name", v), set("data-wc-field", v)]
            }
            AttrOp::DupTarget { v } if !v.is_empty() => vec![
                set("data-wc-action", "duplicate-check"),
                set("data-wc-target", v),
            ],
            AttrOp::Style { v } if !v.is_empty() => vec![AttrEdit::AppendStyle(v.clone())],
            AttrOp::TextSegment { base, text, cls, mode } => {
                let (base, text) = (base.trim(), text.trim());
                if base.is_empty() || text.is_empty() {
                    vec![]
                } else {
                    vec![AttrEdit::TextSegment {
                        base: base.to_string(),
                        text: text.to_string(),
                        cls: cls.trim().to_string(),
                        mode: *mode,
                    }]
                }
            }
            _ => vec![],
        }
    }
}

/// `rel` after adding `noopener` and `noreferrer`, keeping existing tokens
/// in order without duplicates.
pub fn merge_rel(prev: &str) -> String {
    let mut tokens: Vec<&str> = Vec::new();
    for t in prev.split_whitespace().chain(["noopener", "noreferrer"]) {
        if !tokens.contains(&t) {
            tokens.push(t);
        }
    }
    tokens.join(" ")
}

/// `style` after appending `add`, inserting a `;` separator when needed.
pub fn merge_style(prev: &str, add: &str) -> String {
    if prev.is_empty() {
        add.to_string()
    } else if prev.trim_end().ends_with(';') {
        format!("{prev}{add}")
    } else {
        format!("{prev};{add}")
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

/// Inner HTML for an element whose text is `full` after inserting a
/// `<span data-wc-seg>` around `text` relative to the first `base`.
///
/// Returns `None` when `base` does not occur in `full`.
pub fn text_segment_html(full: &str, base: &str, text: &str, cls: &str, mode: SegmentMode) -> Option<String> {
    let idx = full.find(base)?;
    let before = escape_html(&full[..idx]);
    let after = escape_html(&full[idx + base.len()..]);
    let class_attr = if cls.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", escape_attr(cls))
    };
    let span = format!(
        "<span data-wc-seg=\"{}\"{}>{}</span>",
        escape_attr(base),
        class_attr,
        escape_html(text)
    );
    let base = escape_html(base);

    Some(match mode {
        SegmentMode::Before => format!("{before}{span}{base}{after}"),
        SegmentMode::Replace => format!("{before}{span}{after}"),
        SegmentMode::After => format!("{before}{base}{span}{after}"),
    })
}

/// Applies bundles to markup. Implemented over whatever DOM library the
/// host uses.
pub trait MarkupPostProcessor {
    /// Apply `edits` to every element `target` selects and return the
    /// resulting markup. Unresolvable targets leave the markup unchanged.
    fn apply(&mut self, html: &str, target: &str, edits: &[AttrEdit]) -> String;
}

/// Run the policy table over exported markup.
///
/// Empty markup or an empty table returns `html` untouched. Bundles with a
/// blank target and ops that make no edits are skipped.
pub fn export_markup<P>(html: &str, bundles: &[AttrBundle], processor: &mut P) -> String
where
    P: MarkupPostProcessor + ?Sized,
{
    if html.is_empty() || bundles.is_empty() {
        return html.to_string();
    }

    let mut out = html.to_string();
    for bundle in bundles {
        let target = bundle.target.trim();
        if target.is_empty() {
            continue;
        }
        let edits: Vec<AttrEdit> = bundle.ops.iter().flat_map(AttrOp::edits).collect();
        if edits.is_empty() {
            continue;
        }
        out = processor.apply(&out, target, &edits);
    }
    out.trim().to_string()
}
