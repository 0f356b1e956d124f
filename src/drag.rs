//! Pointer-driven drag state machine with smart snapping.
//!
//! One [`DragController`] serves one canvas. It is either idle or holds a
//! single [`DragSession`]; the session is created on pointer-down over a
//! draggable block and destroyed on pointer-up or on loss of pointer
//! capture, whichever comes first.
//!
//! # Example
//!
//! ```
//! use page_canvas::{BlockRect, BridgeMessage, CanvasModel, DragController, PointerEvent, PointerInput};
//!
//! let mut canvas = CanvasModel::new(1000.0, 600.0);
//! canvas.add_block("hero", BlockRect::new(0.0, 0.0, 200.0, 100.0));
//!
//! let mut drag: DragController = DragController::default();
//! drag.handle(&mut canvas, PointerInput::Down(PointerEvent::on_block(1, 10.0, 10.0, "hero")));
//! drag.handle(&mut canvas, PointerInput::Move(PointerEvent::at(1, 60.0, 30.0)));
//! let commit = drag.handle(&mut canvas, PointerInput::Up(PointerEvent::at(1, 60.0, 30.0)));
//!
//! assert_eq!(
//!     commit,
//!     Some(BridgeMessage::UpdateFreePosition { block_id: "hero".into(), x: 50, y: 20 })
//! );
//! ```

use crate::bridge::BridgeMessage;
use crate::canvas::CanvasSurface;
use crate::config::EditorSettings;
use crate::positions::{BlockId, BlockPosition};
use crate::snap::{BlockRect, NoSnap, SmartSnap, SnapEngine, SnapGuideSet, SnapResult};

/// Pointer position in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: i32,
    pub client_x: f64,
    pub client_y: f64,
    /// Block under the pointer, if any.
    pub target: Option<BlockId>,
}

impl PointerEvent {
    pub fn at(pointer_id: i32, client_x: f64, client_y: f64) -> Self {
        Self { pointer_id, client_x, client_y, target: None }
    }

    pub fn on_block(pointer_id: i32, client_x: f64, client_y: f64, block_id: &str) -> Self {
        Self {
            pointer_id,
            client_x,
            client_y,
            target: Some(block_id.to_string()),
        }
    }
}

/// Events of one gesture: down, any number of moves, then up or lost capture.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Down(PointerEvent),
    Move(PointerEvent),
    Up(PointerEvent),
    LostCapture { pointer_id: i32 },
}

/// Everything captured when a drag starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub block_id: BlockId,
    pub pointer_id: i32,
    /// Block offset before the drag.
    pub origin: (f64, f64),
    /// Pointer position at pointer-down.
    pub start: (f64, f64),
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub element_width: f64,
    pub element_height: f64,
    pub guides: SnapGuideSet,
    /// Last offset applied to the block.
    pub current: (f64, f64),
}

impl DragSession {
    /// Largest left offset that keeps the block inside the canvas.
    pub fn max_left(&self) -> f64 {
        (self.canvas_width - self.element_width).max(0.0)
    }

    /// Horizontal clamp to `[0, max_left]`, vertical to `>= 0`. The canvas
    /// grows downward, so there is no lower bound.
    pub fn clamp(&self, left: f64, top: f64) -> (f64, f64) {
        (left.clamp(0.0, self.max_left()), top.max(0.0))
    }
}

/// Drag state machine for one canvas.
pub struct DragController<E = SmartSnap> {
    engine: E,
    settings: EditorSettings,
    session: Option<DragSession>,
}

impl Default for DragController<SmartSnap> {
    fn default() -> Self {
        Self::new(SmartSnap::default(), EditorSettings::default())
    }
}

impl DragController<Box<dyn SnapEngine>> {
    /// Controller whose snapping follows `settings.snap_enabled`.
    pub fn from_settings(settings: EditorSettings) -> Self {
        let engine: Box<dyn SnapEngine> = if settings.snap_enabled {
            Box::new(SmartSnap::new(settings.snap_threshold))
        } else {
            Box::new(NoSnap)
        };
        Self::new(engine, settings)
    }
}

impl<E: SnapEngine> DragController<E> {
    pub fn new(engine: E, settings: EditorSettings) -> Self {
        Self {
            engine,
            settings,
            session: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Feed one pointer event. Returns the host notification it produced.
    pub fn handle<C>(&mut self, canvas: &mut C, input: PointerInput) -> Option<BridgeMessage>
    where
        C: CanvasSurface + ?Sized,
    {
        match input {
            PointerInput::Down(ev) => self.pointer_down(canvas, &ev),
            PointerInput::Move(ev) => {
                self.pointer_move(canvas, &ev);
                None
            }
            PointerInput::Up(ev) => self.pointer_up(canvas, &ev).map(BridgeMessage::from),
            PointerInput::LostCapture { pointer_id } => {
                self.lost_capture(canvas, pointer_id);
                None
            }
        }
    }

    /// Start a drag on the draggable block under the pointer, climbing out of
    /// nested blocks. Ignored while a drag is active.
    pub fn pointer_down<C>(&mut self, canvas: &mut C, ev: &PointerEvent) -> Option<BridgeMessage>
    where
        C: CanvasSurface + ?Sized,
    {
        if self.session.is_some() {
            return None;
        }
        let target = canvas.drag_target(ev.target.as_deref()?)?;
        let block_id = target.as_str();
        let rect = canvas.block_rect(block_id)?;

        let guides = self.engine.snapshot(&canvas.draggable_blocks(), block_id);
        self.session = Some(DragSession {
            block_id: block_id.to_string(),
            pointer_id: ev.pointer_id,
            origin: (rect.left, rect.top),
            start: (ev.client_x, ev.client_y),
            canvas_width: canvas.width(),
            canvas_height: canvas.scroll_height(),
            element_width: rect.width,
            element_height: rect.height,
            guides,
            current: (rect.left, rect.top),
        });

        canvas.set_dragging(block_id, true);
        canvas.capture_pointer(block_id, ev.pointer_id);
        tracing::trace!(block_id, pointer_id = ev.pointer_id, "drag started");

        Some(BridgeMessage::SelectBlock {
            block_id: block_id.to_string(),
        })
    }

    /// Move the dragged block: clamp, snap against the frozen guides, clamp
    /// again, then apply. Returns the snap that was applied.
    pub fn pointer_move<C>(&mut self, canvas: &mut C, ev: &PointerEvent) -> Option<SnapResult>
    where
        C: CanvasSurface + ?Sized,
    {
        let session = self.session.as_mut().filter(|s| s.pointer_id == ev.pointer_id)?;

        let (left, top) = session.clamp(
            session.origin.0 + (ev.client_x - session.start.0),
            session.origin.1 + (ev.client_y - session.start.1),
        );

        let moving = BlockRect::new(left, top, session.element_width, session.element_height);
        let snap = self.engine.snap(moving, &session.guides);

        canvas.hide_guides();
        if snap.snapped() {
            canvas.show_guides(snap.vertical, snap.horizontal);
        }

        let (left, top) = session.clamp(left + snap.dx, top + snap.dy);

        let edge = self.settings.auto_scroll_edge;
        let speed = self.settings.auto_scroll_speed;
        if ev.client_y > canvas.viewport_height() - edge {
            canvas.scroll_by(speed);
        } else if ev.client_y < edge {
            canvas.scroll_by(-speed);
        }

        canvas.set_offset(&session.block_id, left, top);
        session.current = (left, top);
        Some(snap)
    }

    /// Finish the drag and produce the committed position.
    pub fn pointer_up<C>(&mut self, canvas: &mut C, ev: &PointerEvent) -> Option<BlockPosition>
    where
        C: CanvasSurface + ?Sized,
    {
        if self.session.as_ref()?.pointer_id != ev.pointer_id {
            return None;
        }
        let session = self.session.take()?;

        canvas.hide_guides();
        canvas.set_dragging(&session.block_id, false);
        canvas.release_pointer(&session.block_id, session.pointer_id);

        let (left, top) = canvas
            .block_rect(&session.block_id)
            .map(|r| (r.left, r.top))
            .unwrap_or(session.current);
        let x = left.round().clamp(0.0, session.max_left().floor());
        let y = top.round().max(0.0);

        canvas.schedule_height_update();
        tracing::debug!(block_id = %session.block_id, x, y, "drag committed");

        Some(BlockPosition {
            block_id: session.block_id,
            x: x as u32,
            y: y as u32,
        })
    }

    /// Pointer capture went away without a pointer-up: drop the session,
    /// put the block back where it started, and commit nothing.
    pub fn lost_capture<C>(&mut self, canvas: &mut C, pointer_id: i32)
    where
        C: CanvasSurface + ?Sized,
    {
        if self.session.as_ref().map(|s| s.pointer_id) != Some(pointer_id) {
            return;
        }
        let Some(session) = self.session.take() else {
            return;
        };
        canvas.hide_guides();
        canvas.set_dragging(&session.block_id, false);
        canvas.set_offset(&session.block_id, session.origin.0, session.origin.1);
        tracing::debug!(block_id = %session.block_id, "drag cancelled: pointer capture lost");
    }
}
