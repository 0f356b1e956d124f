//! Editor tunables shared by the native drag controller and the sandbox runtime.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Maximum distance (px) at which a reference line snaps to a guide.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 6.0;
/// Distance (px) from the viewport top/bottom that triggers auto-scroll.
pub const DEFAULT_AUTO_SCROLL_EDGE: f64 = 40.0;
/// Pixels scrolled per pointer move while inside the auto-scroll band.
pub const DEFAULT_AUTO_SCROLL_SPEED: f64 = 18.0;

/// Direct-manipulation settings.
///
/// These are forwarded verbatim into every synthesized document so the
/// embedded drag shim and [`DragController`](crate::DragController) behave
/// identically.
///
/// ```toml
/// snap_threshold = 6.0
/// auto_scroll_edge = 40.0
/// auto_scroll_speed = 18.0
/// snap_enabled = true
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorSettings {
    pub snap_threshold: f64,
    pub auto_scroll_edge: f64,
    pub auto_scroll_speed: f64,
    pub snap_enabled: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            auto_scroll_edge: DEFAULT_AUTO_SCROLL_EDGE,
            auto_scroll_speed: DEFAULT_AUTO_SCROLL_SPEED,
            snap_enabled: true,
        }
    }
}

impl EditorSettings {
    /// Parse settings from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()
    }

    /// Parse settings from JSON. Missing keys keep their defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(source)?;
        settings.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !self.snap_threshold.is_finite() || self.snap_threshold < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "snap_threshold",
                reason: "must be a finite, non-negative number",
            });
        }
        if !self.auto_scroll_edge.is_finite() || self.auto_scroll_edge < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "auto_scroll_edge",
                reason: "must be a finite, non-negative number",
            });
        }
        if !self.auto_scroll_speed.is_finite() || self.auto_scroll_speed < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "auto_scroll_speed",
                reason: "must be a finite, non-negative number",
            });
        }
        Ok(self)
    }
}
