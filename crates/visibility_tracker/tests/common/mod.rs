#![allow(dead_code)]
//! Shared fixtures: a rect-backed fake element and a manually-driven host.

use anyhow::Error;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use visibility_tracker::{Bounded, Host, Rect, Trigger, TriggerListener, Viewport};

pub const VIEWPORT: Viewport = Viewport {
    width: 1280.0,
    height: 720.0,
};

pub fn onscreen_rect() -> Rect {
    Rect::from_position(100.0, 100.0, 50.0, 50.0)
}

pub fn below_fold_rect() -> Rect {
    Rect::from_position(100.0, 2000.0, 50.0, 50.0)
}

/// Element double whose bounding box is settable from the test body.
pub struct FakeElement {
    rect: Cell<Option<Rect>>,
    element_node: bool,
}

impl FakeElement {
    pub fn onscreen() -> Rc<Self> {
        Rc::new(Self {
            rect: Cell::new(Some(onscreen_rect())),
            element_node: true,
        })
    }

    pub fn offscreen() -> Rc<Self> {
        Rc::new(Self {
            rect: Cell::new(Some(below_fold_rect())),
            element_node: true,
        })
    }

    /// A handle that is not an element node, e.g. a text or comment node.
    pub fn non_element() -> Rc<Self> {
        Rc::new(Self {
            rect: Cell::new(Some(onscreen_rect())),
            element_node: false,
        })
    }

    pub fn move_to(&self, rect: Rect) {
        self.rect.set(Some(rect));
    }

    pub fn move_onscreen(&self) {
        self.rect.set(Some(onscreen_rect()));
    }

    pub fn move_offscreen(&self) {
        self.rect.set(Some(below_fold_rect()));
    }

    /// Simulate removal from the document.
    pub fn detach(&self) {
        self.rect.set(None);
    }
}

impl Bounded for FakeElement {
    fn bounding_box(&self) -> Option<Rect> {
        self.rect.get()
    }

    fn is_element(&self) -> bool {
        self.element_node
    }
}

/// Host double with a fixed viewport and manual trigger dispatch.
pub struct FakeHost {
    viewport: Cell<Viewport>,
    listener: RefCell<Option<TriggerListener>>,
    mutation_listener: RefCell<Option<TriggerListener>>,
    support_mutations: bool,
}

impl FakeHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            viewport: Cell::new(VIEWPORT),
            listener: RefCell::new(None),
            mutation_listener: RefCell::new(None),
            support_mutations: true,
        })
    }

    pub fn without_mutations() -> Rc<Self> {
        Rc::new(Self {
            viewport: Cell::new(VIEWPORT),
            listener: RefCell::new(None),
            mutation_listener: RefCell::new(None),
            support_mutations: false,
        })
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.viewport.set(viewport);
    }

    /// Fire a window trigger at the installed listener.
    pub fn fire(&self, trigger: Trigger) {
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(trigger);
        }
    }

    /// Fire a DOM mutation at the mutation listener, if observation was
    /// wired.
    pub fn fire_mutation(&self) {
        let listener = self.mutation_listener.borrow().clone();
        if let Some(listener) = listener {
            listener(Trigger::Mutation);
        }
    }
}

impl Host for FakeHost {
    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn install_triggers(&self, listener: TriggerListener) -> Result<(), Error> {
        *self.listener.borrow_mut() = Some(listener);
        Ok(())
    }

    fn observe_mutations(&self, listener: TriggerListener) -> bool {
        if self.support_mutations {
            *self.mutation_listener.borrow_mut() = Some(listener);
            true
        } else {
            false
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
