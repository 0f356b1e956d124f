//! The canvas as seen by the drag controller.
//!
//! [`CanvasSurface`] is the narrow slice of the design surface the
//! controller needs: block geometry, live offsets, pointer capture, scroll
//! and the two guide indicator lines. [`CanvasModel`] implements it in
//! memory, which is what headless hosts and the tests drive.

use crate::positions::{BlockId, PositionMap};
use crate::snap::{BlockRect, GuideLine, SimpleBlockGeometry};
use indexmap::IndexMap;

/// Operations the drag controller performs on the canvas.
pub trait CanvasSurface {
    /// Inner width of the canvas container.
    fn width(&self) -> f64;
    /// Full content height, including the part scrolled out of view.
    fn scroll_height(&self) -> f64;
    fn viewport_height(&self) -> f64;

    /// Whether `block_id` is a draggable direct child of the canvas.
    fn is_draggable(&self, block_id: &str) -> bool;
    /// The block a press on `block_id` drags: the block itself or the
    /// draggable direct child of the canvas that contains it.
    fn drag_target(&self, block_id: &str) -> Option<BlockId> {
        self.is_draggable(block_id).then(|| block_id.to_string())
    }
    /// Draggable direct children in document order.
    fn draggable_blocks(&self) -> Vec<SimpleBlockGeometry>;
    fn block_rect(&self, block_id: &str) -> Option<BlockRect>;

    /// Move a block's live (uncommitted) visual offset.
    fn set_offset(&mut self, block_id: &str, left: f64, top: f64);
    fn set_dragging(&mut self, block_id: &str, dragging: bool);

    fn capture_pointer(&mut self, block_id: &str, pointer_id: i32);
    fn release_pointer(&mut self, block_id: &str, pointer_id: i32);

    fn scroll_by(&mut self, dy: f64);

    fn show_guides(&mut self, vertical: Option<GuideLine>, horizontal: Option<GuideLine>);
    fn hide_guides(&mut self);

    /// Ask for the canvas height to be recomputed once the current event
    /// has finished.
    fn schedule_height_update(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasBlock {
    pub rect: BlockRect,
    pub draggable: bool,
    pub dragging: bool,
}

/// Which guide indicator lines are currently visible.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GuideIndicators {
    pub vertical: Option<GuideLine>,
    pub horizontal: Option<GuideLine>,
}

impl GuideIndicators {
    pub fn visible(&self) -> bool {
        self.vertical.is_some() || self.horizontal.is_some()
    }
}

/// In-memory canvas.
#[derive(Debug, Clone)]
pub struct CanvasModel {
    width: f64,
    viewport_height: f64,
    scroll_y: f64,
    content_height: f64,
    blocks: IndexMap<BlockId, CanvasBlock>,
    /// Nested block id to the id of the block that contains it.
    nested: IndexMap<BlockId, BlockId>,
    captured: Option<(BlockId, i32)>,
    guides: GuideIndicators,
    pending_height_updates: usize,
}

impl CanvasModel {
    pub fn new(width: f64, viewport_height: f64) -> Self {
        Self {
            width,
            viewport_height,
            scroll_y: 0.0,
            content_height: viewport_height,
            blocks: IndexMap::new(),
            nested: IndexMap::new(),
            captured: None,
            guides: GuideIndicators::default(),
            pending_height_updates: 0,
        }
    }

    /// Append a draggable direct child.
    pub fn add_block(&mut self, id: &str, rect: BlockRect) {
        self.insert(id, rect, true);
    }

    /// Append a child that is not flagged draggable.
    pub fn add_static_block(&mut self, id: &str, rect: BlockRect) {
        self.insert(id, rect, false);
    }

    /// Register a block rendered inside `parent` rather than directly on the
    /// canvas. It takes no part in snapping.
    pub fn add_nested_block(&mut self, id: &str, parent: &str) {
        self.nested.insert(id.to_string(), parent.to_string());
    }

    fn insert(&mut self, id: &str, rect: BlockRect, draggable: bool) {
        self.blocks.insert(
            id.to_string(),
            CanvasBlock {
                rect,
                draggable,
                dragging: false,
            },
        );
        self.update_height();
    }

    pub fn block(&self, id: &str) -> Option<&CanvasBlock> {
        self.blocks.get(id)
    }

    /// Place draggable blocks at their committed positions, as the sandbox
    /// does on load.
    pub fn apply_positions(&mut self, positions: &PositionMap) {
        for (id, block) in self.blocks.iter_mut() {
            if !block.draggable {
                continue;
            }
            if let Some(p) = positions.get(id) {
                block.rect.left = f64::from(p.x);
                block.rect.top = f64::from(p.y);
            }
        }
        self.update_height();
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn guides(&self) -> GuideIndicators {
        self.guides
    }

    pub fn captured_pointer(&self) -> Option<(&str, i32)> {
        self.captured.as_ref().map(|(id, p)| (id.as_str(), *p))
    }

    /// Drop pointer capture as if another surface had stolen it.
    pub fn steal_capture(&mut self) -> Option<(BlockId, i32)> {
        self.captured.take()
    }

    pub fn pending_height_updates(&self) -> usize {
        self.pending_height_updates
    }

    /// Run deferred height recalculations. Returns how many were queued.
    pub fn flush_deferred(&mut self) -> usize {
        let n = std::mem::take(&mut self.pending_height_updates);
        if n > 0 {
            self.update_height();
        }
        n
    }

    fn update_height(&mut self) {
        let lowest = self
            .blocks
            .values()
            .map(|b| b.rect.bottom())
            .fold(0.0_f64, f64::max);
        self.content_height = lowest.max(self.viewport_height);
    }
}

impl CanvasSurface for CanvasModel {
    fn width(&self) -> f64 {
        self.width
    }

    fn scroll_height(&self) -> f64 {
        self.content_height
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn is_draggable(&self, block_id: &str) -> bool {
        self.blocks.get(block_id).is_some_and(|b| b.draggable)
    }

    fn drag_target(&self, block_id: &str) -> Option<BlockId> {
        let mut id = block_id;
        // Parent links can only be as deep as the nested table is long.
        for _ in 0..=self.nested.len() {
            match self.nested.get(id) {
                Some(parent) => id = parent,
                None => return self.is_draggable(id).then(|| id.to_string()),
            }
        }
        None
    }

    fn draggable_blocks(&self) -> Vec<SimpleBlockGeometry> {
        self.blocks
            .iter()
            .filter(|(_, b)| b.draggable)
            .map(|(id, b)| SimpleBlockGeometry {
                id: id.clone(),
                rect: b.rect,
            })
            .collect()
    }

    fn block_rect(&self, block_id: &str) -> Option<BlockRect> {
        self.blocks.get(block_id).map(|b| b.rect)
    }

    fn set_offset(&mut self, block_id: &str, left: f64, top: f64) {
        if let Some(b) = self.blocks.get_mut(block_id) {
            b.rect.left = left;
            b.rect.top = top;
        }
    }

    fn set_dragging(&mut self, block_id: &str, dragging: bool) {
        if let Some(b) = self.blocks.get_mut(block_id) {
            b.dragging = dragging;
        }
    }

    fn capture_pointer(&mut self, block_id: &str, pointer_id: i32) {
        self.captured = Some((block_id.to_string(), pointer_id));
    }

    fn release_pointer(&mut self, block_id: &str, pointer_id: i32) {
        if self
            .captured
            .as_ref()
            .is_some_and(|(id, p)| id == block_id && *p == pointer_id)
        {
            self.captured = None;
        }
    }

    fn scroll_by(&mut self, dy: f64) {
        let max = (self.content_height - self.viewport_height).max(0.0);
        self.scroll_y = (self.scroll_y + dy).clamp(0.0, max);
    }

    fn show_guides(&mut self, vertical: Option<GuideLine>, horizontal: Option<GuideLine>) {
        self.guides = GuideIndicators { vertical, horizontal };
    }

    fn hide_guides(&mut self) {
        self.guides = GuideIndicators::default();
    }

    fn schedule_height_update(&mut self) {
        self.pending_height_updates += 1;
    }
}
