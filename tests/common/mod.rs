//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use slint::SharedString;
use std::cell::RefCell;
use std::rc::Rc;

/// Tracks what the host hands back to the UI.
///
/// Each field records calls to the corresponding sink with their arguments.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// Every document passed to the display callback, in order.
    pub displayed: Rc<RefCell<Vec<SharedString>>>,
    /// Raw messages posted from the sandbox side.
    pub posted: Rc<RefCell<Vec<String>>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_count(&self) -> usize {
        self.displayed.borrow().len()
    }

    pub fn last_displayed(&self) -> Option<SharedString> {
        self.displayed.borrow().last().cloned()
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        self.displayed.borrow_mut().clear();
        self.posted.borrow_mut().clear();
    }
}
