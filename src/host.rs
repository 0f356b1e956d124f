//! Host side of the bridge.
//!
//! [`EditorSession`] owns one editor's state: the page store, committed
//! positions, the simulated browser history, the current page and selection,
//! and the errors surfaced from the sandbox. It consumes [`BridgeMessage`]s
//! and produces documents to display.
//!
//! [`EditorHost`] wraps a session for a Slint window: clone it into
//! callbacks, and it hands documents to the display callback after the
//! session borrow is released, so a display callback may call back in.
//!
//! # Example
//!
//! ```ignore
//! use page_canvas::{EditorHost, SurfaceConfig};
//!
//! let host = EditorHost::new(SurfaceConfig::default());
//! let w = window.as_weak();
//!
//! window.set_errors(host.error_model().into());
//! host.on_display(move |doc| {
//!     if let Some(w) = w.upgrade() {
//!         w.set_preview_document(doc);
//!     }
//! });
//! window.on_preview_message(host.message_callback());
//! ```

use crate::bridge::BridgeMessage;
use crate::error::BridgeError;
use crate::page::{Page, PageId, PageStore};
use crate::positions::{BlockId, BlockPosition, PositionMap};
use crate::synth::{synthesize, SurfaceConfig};
use slint::{Model, SharedString, VecModel};
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Result of a page-enter hook. Errors are logged, never propagated.
pub type HookResult = Result<(), Box<dyn std::error::Error>>;

type EnterHook = Box<dyn FnMut(&Page) -> HookResult>;

/// Simulated browser history: a stack of routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationHistory {
    entries: Vec<String>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, route: &str) {
        self.entries.push(route.to_string());
    }

    /// Replace the current entry, or push if the history is empty.
    pub fn replace(&mut self, route: &str) {
        match self.entries.last_mut() {
            Some(last) => *last = route.to_string(),
            None => self.entries.push(route.to_string()),
        }
    }

    /// Drop the current entry and return the one now on top.
    ///
    /// The first entry is never dropped.
    pub fn back(&mut self) -> Option<&str> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.pop();
        self.current()
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    Push,
    Replace,
    Keep,
}

/// One editor's state and its reaction to bridge traffic.
pub struct EditorSession {
    store: PageStore,
    positions: HashMap<PageId, PositionMap>,
    markup: HashMap<PageId, String>,
    base: SurfaceConfig,
    history: NavigationHistory,
    current_page: Option<PageId>,
    selected_block: Option<BlockId>,
    errors: Rc<VecModel<SharedString>>,
    enter_hooks: Vec<EnterHook>,
    document: Option<SharedString>,
    display_pending: bool,
    display_count: usize,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(SurfaceConfig::default())
    }
}

impl EditorSession {
    /// Create a session. `base` supplies everything per-page rendering does
    /// not override: styles, mode, runtimes and settings.
    pub fn new(base: SurfaceConfig) -> Self {
        Self {
            store: PageStore::new(),
            positions: HashMap::new(),
            markup: HashMap::new(),
            base,
            history: NavigationHistory::new(),
            current_page: None,
            selected_block: None,
            errors: Rc::new(VecModel::default()),
            enter_hooks: Vec::new(),
            document: None,
            display_pending: false,
            display_count: 0,
        }
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PageStore {
        &mut self.store
    }

    pub fn base_config(&self) -> &SurfaceConfig {
        &self.base
    }

    pub fn set_base_config(&mut self, base: SurfaceConfig) {
        self.base = base;
    }

    /// Set the structure markup rendered for `page_id`.
    pub fn set_markup(&mut self, page_id: &str, html: impl Into<String>) {
        self.markup.insert(page_id.to_string(), html.into());
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current_page.as_deref().and_then(|id| self.store.page(id))
    }

    pub fn selected_block(&self) -> Option<&str> {
        self.selected_block.as_deref()
    }

    /// Committed positions for a page.
    pub fn positions(&self, page_id: &str) -> Option<&PositionMap> {
        self.positions.get(page_id)
    }

    /// Surfaced sandbox errors, newest last. Bind directly to a Slint list.
    pub fn errors(&self) -> Rc<VecModel<SharedString>> {
        self.errors.clone()
    }

    pub fn error_count(&self) -> usize {
        self.errors.row_count()
    }

    pub fn clear_errors(&mut self) {
        self.errors.set_vec(Vec::new());
    }

    /// The most recently displayed document.
    pub fn document(&self) -> Option<&SharedString> {
        self.document.as_ref()
    }

    /// How many times a document has been displayed.
    pub fn display_count(&self) -> usize {
        self.display_count
    }

    /// The document displayed since the last call, if any.
    pub fn take_display(&mut self) -> Option<SharedString> {
        if std::mem::take(&mut self.display_pending) {
            self.document.clone()
        } else {
            None
        }
    }

    /// Register a hook run whenever the sandbox reports `PAGE_ENTER`.
    ///
    /// A hook that errors or panics is logged and skipped; later hooks still
    /// run.
    pub fn on_page_enter(&mut self, hook: impl FnMut(&Page) -> HookResult + 'static) {
        self.enter_hooks.push(Box::new(hook));
    }

    // === Bridge ===

    /// Decode and handle one raw message.
    ///
    /// Malformed input is logged and returned as an error; it never changes
    /// session state.
    pub fn handle_raw(&mut self, raw: &str) -> Result<(), BridgeError> {
        match BridgeMessage::decode(raw) {
            Ok(msg) => {
                self.handle_message(msg);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed bridge message");
                Err(e)
            }
        }
    }

    pub fn handle_message(&mut self, msg: BridgeMessage) {
        tracing::trace!(kind = msg.kind(), "bridge message");
        match msg {
            BridgeMessage::Navigate { page_id } => {
                self.navigate(&page_id, HistoryMode::Push, true);
            }
            BridgeMessage::Redirect { page_id } => {
                self.navigate(&page_id, HistoryMode::Replace, true);
            }
            BridgeMessage::SelectBlock { block_id } => {
                self.selected_block = Some(block_id);
            }
            BridgeMessage::UpdateFreePosition { block_id, x, y } => {
                let Some(page) = self.current_page.clone() else {
                    tracing::debug!(block_id = %block_id, "position commit with no page displayed, ignoring");
                    return;
                };
                self.positions
                    .entry(page)
                    .or_default()
                    .commit(&BlockPosition { block_id, x, y });
            }
            ref err @ BridgeMessage::IframeError { .. } => {
                let text = err.error_text().unwrap_or_default().to_string();
                self.surface_error(&text);
            }
            BridgeMessage::PageEnter { page_id } => self.run_enter_hooks(&page_id),
            BridgeMessage::Unknown => {
                tracing::debug!("ignoring unknown bridge message");
            }
        }
    }

    // === Navigation ===

    /// Open a page by id without going through the bridge: no lock, new
    /// history entry. Returns false for unknown pages.
    pub fn open_page(&mut self, page_id: &str) -> bool {
        self.navigate(page_id, HistoryMode::Push, false)
    }

    /// Direct URL entry. Resolves `path` through the route index and displays
    /// the page without locking it.
    pub fn enter_url(&mut self, path: &str) -> bool {
        let Some(page_id) = self.store.page_id_by_url(path).cloned() else {
            tracing::debug!(path, "no page for url");
            return false;
        };
        self.navigate(&page_id, HistoryMode::Push, false)
    }

    /// Pop one history entry and display the page now on top.
    ///
    /// Returns false when there is nothing to go back to, or the previous
    /// route no longer resolves.
    pub fn back(&mut self) -> bool {
        let Some(route) = self.history.back().map(str::to_string) else {
            return false;
        };
        let Some(page_id) = self.store.page_id_by_url(&route).cloned() else {
            tracing::debug!(route = %route, "history entry no longer resolves");
            return false;
        };
        self.navigate(&page_id, HistoryMode::Keep, false)
    }

    fn navigate(&mut self, page_id: &str, mode: HistoryMode, lock: bool) -> bool {
        if lock {
            self.store.lock_page(page_id);
        }
        let Some(page) = self.store.page(page_id) else {
            tracing::debug!(page_id, "navigation to unknown page ignored");
            return false;
        };
        let route = page.route.clone();

        match mode {
            HistoryMode::Push => self.history.push(&route),
            HistoryMode::Replace => self.history.replace(&route),
            HistoryMode::Keep => {}
        }
        self.current_page = Some(page_id.to_string());
        self.selected_block = None;
        self.display(page_id);
        true
    }

    /// Synthesize the document for a page from the base config, its markup
    /// and its committed positions.
    pub fn render(&self, page_id: &str) -> Option<String> {
        let page = self.store.page(page_id)?;
        let config = SurfaceConfig {
            structure_html: self.markup.get(page_id).cloned().unwrap_or_default(),
            positions_map: self.positions.get(page_id).cloned().unwrap_or_default(),
            page_id: page.id.clone(),
            page_route: page.route.clone(),
            ..self.base.clone()
        };
        Some(synthesize(&config))
    }

    fn display(&mut self, page_id: &str) {
        if let Some(doc) = self.render(page_id) {
            self.document = Some(doc.into());
            self.display_pending = true;
            self.display_count += 1;
        }
    }

    // === Errors and hooks ===

    /// Surface a sandbox error to the user.
    pub fn surface_error(&mut self, message: &str) {
        let text = if message.trim().is_empty() {
            "Preview error: unknown error".to_string()
        } else {
            format!("Preview error: {message}")
        };
        tracing::warn!(message, "sandbox error");
        self.errors.push(text.into());
    }

    fn run_enter_hooks(&mut self, page_id: &str) {
        let Some(page) = self.store.page(page_id) else {
            tracing::debug!(page_id, "page enter for unknown page");
            return;
        };
        for (i, hook) in self.enter_hooks.iter_mut().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| hook(page))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(hook = i, page_id, error = %e, "page enter hook failed"),
                Err(_) => tracing::error!(hook = i, page_id, "page enter hook panicked"),
            }
        }
    }
}

/// Shared handle to an [`EditorSession`] for wiring UI callbacks.
///
/// Clone it into each callback.
#[derive(Clone)]
pub struct EditorHost {
    session: Rc<RefCell<EditorSession>>,
    display: Rc<RefCell<Option<Rc<dyn Fn(SharedString)>>>>,
}

impl Default for EditorHost {
    fn default() -> Self {
        Self::new(SurfaceConfig::default())
    }
}

impl EditorHost {
    pub fn new(base: SurfaceConfig) -> Self {
        Self {
            session: Rc::new(RefCell::new(EditorSession::new(base))),
            display: Rc::new(RefCell::new(None)),
        }
    }

    pub fn session(&self) -> Rc<RefCell<EditorSession>> {
        self.session.clone()
    }

    /// Error list model for binding to the UI.
    pub fn error_model(&self) -> Rc<VecModel<SharedString>> {
        self.session.borrow().errors()
    }

    /// Set the callback that receives every displayed document.
    pub fn on_display(&self, f: impl Fn(SharedString) + 'static) {
        *self.display.borrow_mut() = Some(Rc::new(f));
    }

    /// Run `f` against the session, then deliver any document it displayed.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut EditorSession) -> R) -> R {
        let (out, doc) = {
            let mut session = self.session.borrow_mut();
            let out = f(&mut session);
            (out, session.take_display())
        };
        if let Some(doc) = doc {
            let sink = self.display.borrow().clone();
            if let Some(sink) = sink {
                sink(doc);
            }
        }
        out
    }

    // === Callback factories ===

    /// Returns a callback for raw messages posted by the sandbox.
    pub fn message_callback(&self) -> impl Fn(SharedString) {
        let host = self.clone();
        move |raw| {
            let _ = host.with_session(|s| s.handle_raw(&raw));
        }
    }

    /// Returns a callback for the address bar. Yields whether the URL resolved.
    pub fn url_entered_callback(&self) -> impl Fn(SharedString) -> bool {
        let host = self.clone();
        move |path| host.with_session(|s| s.enter_url(&path))
    }

    /// Returns a callback for the back button.
    pub fn back_callback(&self) -> impl Fn() -> bool {
        let host = self.clone();
        move || host.with_session(|s| s.back())
    }
}
