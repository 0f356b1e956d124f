//! Alignment guides and smart snapping.
//!
//! Pure geometry: nothing here touches the canvas. The drag controller takes
//! one [`SnapGuideSet`] snapshot at drag start and asks a [`SnapEngine`] for
//! a correction on every move.

use crate::config::DEFAULT_SNAP_THRESHOLD;

/// Axis-aligned rectangle in canvas-relative pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BlockRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        (self.left + self.right()) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom()) / 2.0
    }

    /// Left, center and right lines.
    pub fn vertical_lines(&self) -> [f64; 3] {
        [self.left, self.center_x(), self.right()]
    }

    /// Top, center and bottom lines.
    pub fn horizontal_lines(&self) -> [f64; 3] {
        [self.top, self.center_y(), self.bottom()]
    }
}

/// Geometry a block must expose to take part in guide collection.
pub trait BlockGeometry {
    fn block_id(&self) -> &str;
    fn rect(&self) -> BlockRect;
}

/// Plain implementation of [`BlockGeometry`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleBlockGeometry {
    pub id: String,
    pub rect: BlockRect,
}

impl BlockGeometry for SimpleBlockGeometry {
    fn block_id(&self) -> &str { &self.id }
    fn rect(&self) -> BlockRect { self.rect }
}

impl<T: BlockGeometry> BlockGeometry for &T {
    fn block_id(&self) -> &str { (*self).block_id() }
    fn rect(&self) -> BlockRect { (*self).rect() }
}

/// Snap candidates contributed by one sibling block.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideItem {
    pub block_id: String,
    pub rect: BlockRect,
    pub vertical: [f64; 3],
    pub horizontal: [f64; 3],
}

/// Guide lines of every sibling, frozen at drag start.
///
/// Items keep the order the blocks were supplied in (DOM child order), which
/// is what makes tie-breaking reproducible.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapGuideSet {
    pub items: Vec<GuideItem>,
}

impl SnapGuideSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// A matched alignment line plus the span to draw it over.
///
/// For a vertical line `position` is an x coordinate and `start..end` a y
/// range covering both the moved and the matched block; horizontal lines
/// swap the axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SnapResult {
    pub dx: f64,
    pub dy: f64,
    pub vertical: Option<GuideLine>,
    pub horizontal: Option<GuideLine>,
}

impl SnapResult {
    pub fn snapped(&self) -> bool {
        self.vertical.is_some() || self.horizontal.is_some()
    }
}

/// Build guides from every block except `exclude`.
pub fn collect_guides<B, I>(blocks: I, exclude: &str) -> SnapGuideSet
where
    B: BlockGeometry,
    I: IntoIterator<Item = B>,
{
    let items = blocks
        .into_iter()
        .filter(|b| b.block_id() != exclude)
        .map(|b| {
            let rect = b.rect();
            GuideItem {
                block_id: b.block_id().to_string(),
                rect,
                vertical: rect.vertical_lines(),
                horizontal: rect.horizontal_lines(),
            }
        })
        .collect();

    SnapGuideSet { items }
}

/// Find the smallest correction that aligns `moving` with a guide.
///
/// Each axis is solved independently. A pair only wins when its distance is
/// strictly below both `threshold` and the best distance seen so far, so the
/// first pair found at the minimal distance is kept. Axes with no candidate
/// get a zero offset and no line.
pub fn compute_smart_snap(moving: BlockRect, guides: &SnapGuideSet, threshold: f64) -> SnapResult {
    let own_v = moving.vertical_lines();
    let own_h = moving.horizontal_lines();

    let mut result = SnapResult::default();
    let mut best_v = threshold;
    let mut best_h = threshold;

    for item in &guides.items {
        for &gx in &item.vertical {
            for &sx in &own_v {
                let d = (gx - sx).abs();
                if d < best_v {
                    best_v = d;
                    result.dx = gx - sx;
                    result.vertical = Some(GuideLine {
                        position: gx,
                        start: moving.top.min(item.rect.top),
                        end: moving.bottom().max(item.rect.bottom()),
                    });
                }
            }
        }
        for &gy in &item.horizontal {
            for &sy in &own_h {
                let d = (gy - sy).abs();
                if d < best_h {
                    best_h = d;
                    result.dy = gy - sy;
                    result.horizontal = Some(GuideLine {
                        position: gy,
                        start: moving.left.min(item.rect.left),
                        end: moving.right().max(item.rect.right()),
                    });
                }
            }
        }
    }

    result
}

/// Guide snapshotting and snapping, injected into the drag controller.
pub trait SnapEngine {
    fn snapshot(&self, blocks: &[SimpleBlockGeometry], exclude: &str) -> SnapGuideSet;
    fn snap(&self, moving: BlockRect, guides: &SnapGuideSet) -> SnapResult;
}

impl<E: SnapEngine + ?Sized> SnapEngine for Box<E> {
    fn snapshot(&self, blocks: &[SimpleBlockGeometry], exclude: &str) -> SnapGuideSet {
        (**self).snapshot(blocks, exclude)
    }

    fn snap(&self, moving: BlockRect, guides: &SnapGuideSet) -> SnapResult {
        (**self).snap(moving, guides)
    }
}

/// Edge/center snapping within a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmartSnap {
    pub threshold: f64,
}

impl Default for SmartSnap {
    fn default() -> Self {
        Self { threshold: DEFAULT_SNAP_THRESHOLD }
    }
}

impl SmartSnap {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl SnapEngine for SmartSnap {
    fn snapshot(&self, blocks: &[SimpleBlockGeometry], exclude: &str) -> SnapGuideSet {
        collect_guides(blocks, exclude)
    }

    fn snap(&self, moving: BlockRect, guides: &SnapGuideSet) -> SnapResult {
        compute_smart_snap(moving, guides, self.threshold)
    }
}

/// Engine used when snapping is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnap;

impl SnapEngine for NoSnap {
    fn snapshot(&self, _blocks: &[SimpleBlockGeometry], _exclude: &str) -> SnapGuideSet {
        SnapGuideSet::default()
    }

    fn snap(&self, _moving: BlockRect, _guides: &SnapGuideSet) -> SnapResult {
        SnapResult::default()
    }
}
