//! # Page Canvas
//!
//! Live preview and direct-manipulation engine for a visual page builder.
//! Blocks are arranged on a canvas inside a sandboxed preview document; this
//! crate builds that document, drives block dragging with smart alignment
//! snapping, carries the message protocol between host and sandbox, and owns
//! the page/route model navigation resolves against.
//!
//! ## Features
//!
//! - **Page Model** - Draft pages follow their name's slug, locked pages keep a stable route
//! - **Smart Snap** - Edge and center alignment against sibling blocks, 6px threshold
//! - **Drag Controller** - Clamp, snap, clamp again; commits are integer and in bounds
//! - **Typed Bridge** - Closed message enum with forward-compatible unknown tags
//! - **Document Synthesis** - Deterministic documents from fixed, versioned runtime bundles
//!
//! ## Quick Start
//!
//! ```
//! use page_canvas::{BridgeMessage, EditorSession, PageStatus};
//!
//! let mut session = EditorSession::default();
//! let about = session.store_mut().create_page("About Us");
//! assert_eq!(about.route, "/about-us");
//!
//! session.handle_message(BridgeMessage::Navigate { page_id: about.id.clone() });
//! assert_eq!(session.store().page(&about.id).unwrap().status, PageStatus::Locked);
//! assert!(session.document().is_some());
//! ```
//!
//! ## Modules
//!
//! - [`page`] - [`PageStore`] and [`slugify`]
//! - [`snap`] - [`collect_guides`], [`compute_smart_snap`] and the [`SnapEngine`] seam
//! - [`drag`] - [`DragController`] over any [`CanvasSurface`]
//! - [`bridge`] - [`BridgeMessage`]
//! - [`host`] - [`EditorSession`] and the Slint-facing [`EditorHost`]
//! - [`synth`] - [`synthesize`] and [`SurfaceConfig`]
//! - [`content_attrs`] - Attribute policy table for exported markup

pub mod bridge;
pub mod canvas;
pub mod config;
pub mod content_attrs;
pub mod drag;
pub mod error;
pub mod host;
pub mod page;
pub mod positions;
pub mod runtime;
pub mod snap;
pub mod synth;

pub use bridge::{BridgeMessage, ErrorDetail};
pub use canvas::{CanvasBlock, CanvasModel, CanvasSurface, GuideIndicators};
pub use config::EditorSettings;
pub use content_attrs::{export_markup, AttrBundle, AttrEdit, AttrOp, MarkupPostProcessor, SegmentMode};
pub use drag::{DragController, DragSession, PointerEvent, PointerInput};
pub use error::{BridgeError, ConfigError, RouteConflict};
pub use host::{EditorHost, EditorSession, HookResult, NavigationHistory};
pub use page::{slugify, ElementKind, Page, PageId, PageStatus, PageStore};
pub use positions::{BlockId, BlockPosition, Point, PositionMap};
pub use runtime::{Bundle, RUNTIME_VERSION};
pub use snap::{
    collect_guides, compute_smart_snap, BlockGeometry, BlockRect, GuideItem, GuideLine,
    NoSnap, SimpleBlockGeometry, SmartSnap, SnapEngine, SnapGuideSet, SnapResult,
};
pub use synth::{synthesize, SurfaceConfig};
