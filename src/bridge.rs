//! Wire protocol between the host and the sandboxed preview.
//!
//! Messages are JSON objects tagged by `type`, posted fire-and-forget across
//! the frame boundary. Each one is self-contained, so receivers can apply
//! them idempotently and in any interleaving.
//!
//! Tags this version does not know decode to [`BridgeMessage::Unknown`] and
//! are ignored by the host, which keeps older hosts working with newer
//! sandboxes.
//!
//! ```
//! use page_canvas::BridgeMessage;
//!
//! let msg = BridgeMessage::decode(r#"{"type":"NAVIGATE","pageId":"page_abc123"}"#).unwrap();
//! assert_eq!(msg, BridgeMessage::Navigate { page_id: "page_abc123".into() });
//! ```

use crate::error::BridgeError;
use crate::page::PageId;
use crate::positions::{BlockId, BlockPosition};
use serde::{Deserialize, Serialize};

/// Detail object carried by `IFRAME_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// In-page navigation: lock the target and push a history entry.
    #[serde(rename = "NAVIGATE", rename_all = "camelCase")]
    Navigate { page_id: PageId },

    /// Like `Navigate`, but replaces the current history entry.
    #[serde(rename = "REDIRECT", rename_all = "camelCase")]
    Redirect { page_id: PageId },

    /// A block was picked up on the canvas.
    #[serde(rename = "SELECT_BLOCK", alias = "select_block", rename_all = "camelCase")]
    SelectBlock { block_id: BlockId },

    /// A drag ended; the block's committed, clamped position.
    #[serde(
        rename = "UPDATE_FREE_POSITION",
        alias = "update_free_position",
        rename_all = "camelCase"
    )]
    UpdateFreePosition { block_id: BlockId, x: u32, y: u32 },

    /// Uncaught error inside the sandbox.
    ///
    /// Accepts both `{"error":{"message":..}}` and a flat `{"message":..}`.
    #[serde(rename = "IFRAME_ERROR")]
    IframeError {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorDetail>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The sandbox finished loading the page.
    #[serde(rename = "PAGE_ENTER", rename_all = "camelCase")]
    PageEnter { page_id: PageId },

    #[serde(other)]
    Unknown,
}

impl BridgeMessage {
    /// Decode a raw message. Unknown tags decode successfully to `Unknown`.
    pub fn decode(raw: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, BridgeError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn encode(&self) -> String {
        // Serializing plain strings and integers cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn iframe_error(message: impl Into<String>) -> Self {
        BridgeMessage::IframeError {
            error: Some(ErrorDetail { message: message.into() }),
            message: None,
        }
    }

    /// The human-readable text of an `IFRAME_ERROR`, if this is one.
    pub fn error_text(&self) -> Option<&str> {
        match self {
            BridgeMessage::IframeError { error, message } => Some(
                error
                    .as_ref()
                    .map(|e| e.message.as_str())
                    .or(message.as_deref())
                    .unwrap_or(""),
            ),
            _ => None,
        }
    }

    /// Wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeMessage::Navigate { .. } => "NAVIGATE",
            BridgeMessage::Redirect { .. } => "REDIRECT",
            BridgeMessage::SelectBlock { .. } => "SELECT_BLOCK",
            BridgeMessage::UpdateFreePosition { .. } => "UPDATE_FREE_POSITION",
            BridgeMessage::IframeError { .. } => "IFRAME_ERROR",
            BridgeMessage::PageEnter { .. } => "PAGE_ENTER",
            BridgeMessage::Unknown => "UNKNOWN",
        }
    }
}

impl From<BlockPosition> for BridgeMessage {
    fn from(p: BlockPosition) -> Self {
        BridgeMessage::UpdateFreePosition {
            block_id: p.block_id,
            x: p.x,
            y: p.y,
        }
    }
}
