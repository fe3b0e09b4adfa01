//! Simple event bus between the chat runtime and whatever front end drives it.
//!
//! The bus is single-threaded and uses interior mutability via RefCell.
//! Events are buffered until the front end drains them.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use scout_types::event::ChatEvent;

/// Shared event bus — clone-cheap via Rc.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<ChatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ChatEvent) {
        log::trace!("event: {:?}", event);
        self.inner.borrow_mut().push_back(event);
    }

    /// Drain all pending events in emission order.
    pub fn drain(&self) -> Vec<ChatEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}
