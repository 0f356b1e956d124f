//! Test harness wiring a host, a canvas and a drag controller together.
//!
//! Messages produced by the drag controller go through the same wire
//! encoding and message callback a real sandbox would use.

#![allow(dead_code)]

use super::CallbackTracker;
use page_canvas::{
    BlockRect, BridgeMessage, CanvasModel, DragController, EditorHost, EditorSession, PageId,
    PointerEvent, PointerInput, SurfaceConfig,
};
use slint::{Model, SharedString};

pub const CANVAS_WIDTH: f64 = 1000.0;
pub const VIEWPORT_HEIGHT: f64 = 600.0;

pub struct SessionHarness {
    pub host: EditorHost,
    pub canvas: CanvasModel,
    pub drag: DragController,
    pub tracker: CallbackTracker,
    on_message: Box<dyn Fn(SharedString)>,
}

impl SessionHarness {
    pub fn new() -> Self {
        Self::with_config(SurfaceConfig::default())
    }

    pub fn with_config(config: SurfaceConfig) -> Self {
        let host = EditorHost::new(config);
        let tracker = CallbackTracker::new();

        host.on_display({
            let displayed = tracker.displayed.clone();
            move |doc| displayed.borrow_mut().push(doc)
        });
        let on_message = Box::new(host.message_callback());

        Self {
            host,
            canvas: CanvasModel::new(CANVAS_WIDTH, VIEWPORT_HEIGHT),
            drag: DragController::default(),
            tracker,
            on_message,
        }
    }

    /// Read the session state.
    pub fn inspect<R>(&self, f: impl FnOnce(&EditorSession) -> R) -> R {
        f(&self.host.session().borrow())
    }

    /// Create a page and give it some markup.
    pub fn page(&self, name: &str) -> PageId {
        self.host.with_session(|s| {
            let id = s.store_mut().create_page(name).id;
            s.set_markup(&id, format!("<section data-page=\"{name}\"></section>"));
            id
        })
    }

    /// Post a raw JSON message as the sandbox would.
    pub fn post(&self, raw: &str) {
        self.tracker.posted.borrow_mut().push(raw.to_string());
        (self.on_message)(raw.into());
    }

    pub fn send(&self, msg: &BridgeMessage) {
        self.post(&msg.encode());
    }

    pub fn add_block(&mut self, id: &str, left: f64, top: f64, width: f64, height: f64) {
        self.canvas.add_block(id, BlockRect::new(left, top, width, height));
    }

    /// Feed one pointer input to the controller and forward any
    /// notification across the bridge.
    pub fn pointer(&mut self, input: PointerInput) -> Option<BridgeMessage> {
        let msg = self.drag.handle(&mut self.canvas, input);
        if let Some(msg) = &msg {
            self.send(msg);
        }
        msg
    }

    /// Full gesture: down on `id` at `from`, one move per point, up at the last.
    pub fn drag_block(&mut self, id: &str, from: (f64, f64), path: &[(f64, f64)]) -> Option<BridgeMessage> {
        self.pointer(PointerInput::Down(PointerEvent::on_block(1, from.0, from.1, id)));
        let mut last = from;
        for &(x, y) in path {
            self.pointer(PointerInput::Move(PointerEvent::at(1, x, y)));
            last = (x, y);
        }
        self.pointer(PointerInput::Up(PointerEvent::at(1, last.0, last.1)))
    }

    pub fn errors(&self) -> Vec<String> {
        self.host.error_model().iter().map(|s| s.to_string()).collect()
    }
}
