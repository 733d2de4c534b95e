//! Per-group visibility state and event dispatch.

use log::{debug, trace};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;
use viewport::{Bounded, Offset, in_viewport};

use crate::host::Host;

/// A tracked element handle. Equality is reference identity.
pub type Element = Rc<dyn Bounded>;

/// Kind of visibility transition a handler subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The element's in-view status flipped to true.
    Enter,
    /// The element's in-view status flipped to false.
    Exit,
}

/// Callback invoked with the element whose state flipped. `Rc` so the
/// dispatch path can snapshot handler lists without holding a borrow
/// across the call; stateful callbacks capture their own cells.
pub type Handler = Rc<dyn Fn(&Element)>;

type HandlerList = SmallVec<[Handler; 2]>;

#[derive(Default)]
struct HandlerMap {
    enter: HandlerList,
    exit: HandlerList,
}

impl HandlerMap {
    fn kind(&self, kind: EventKind) -> &HandlerList {
        match kind {
            EventKind::Enter => &self.enter,
            EventKind::Exit => &self.exit,
        }
    }

    fn kind_mut(&mut self, kind: EventKind) -> &mut HandlerList {
        match kind {
            EventKind::Enter => &mut self.enter,
            EventKind::Exit => &mut self.exit,
        }
    }
}

struct RegistryInner {
    id: u64,
    /// Fixed at construction; there is no add/remove element operation.
    elements: Vec<Element>,
    /// Registry-specific override of the tracker's shared offset.
    offset: Option<Offset>,
    /// Elements whose most recent predicate evaluation returned true.
    current: Vec<Element>,
    handlers: HandlerMap,
    singles: HandlerMap,
}

/// A group of elements tracked together for visibility transitions.
///
/// Obtained from `Tracker::observe`. Cloning yields another handle to the
/// same group; the owning tracker keeps one for its check loop.
#[derive(Clone)]
pub struct Registry {
    inner: Rc<RefCell<RegistryInner>>,
    shared_offset: Rc<RefCell<Offset>>,
    host: Rc<dyn Host>,
}

impl Registry {
    pub(crate) fn new(
        id: u64,
        elements: Vec<Element>,
        shared_offset: Rc<RefCell<Offset>>,
        host: Rc<dyn Host>,
    ) -> Self {
        debug!("registry {id}: tracking {} elements", elements.len());
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                id,
                elements,
                offset: None,
                current: Vec::new(),
                handlers: HandlerMap::default(),
                singles: HandlerMap::default(),
            })),
            shared_offset,
            host,
        }
    }

    /// Tracker-assigned identifier for this group.
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Number of elements in the group.
    pub fn element_count(&self) -> usize {
        self.inner.borrow().elements.len()
    }

    /// Number of elements currently classified in view.
    pub fn current_count(&self) -> usize {
        self.inner.borrow().current.len()
    }

    /// Whether `element` is currently classified in view.
    pub fn is_current(&self, element: &Element) -> bool {
        self.inner
            .borrow()
            .current
            .iter()
            .any(|tracked| Rc::ptr_eq(tracked, element))
    }

    /// Override the shared offset for this group only.
    pub fn set_offset(&self, offset: Offset) -> &Self {
        self.inner.borrow_mut().offset = Some(offset);
        self
    }

    /// Drop the override and fall back to the shared offset.
    pub fn clear_offset(&self) -> &Self {
        self.inner.borrow_mut().offset = None;
        self
    }

    /// Re-evaluate every element and fire enter/exit events for those
    /// whose in-view status flipped. Fully synchronous.
    pub fn check(&self) -> &Self {
        let (registry_id, elements, offset) = {
            let inner = self.inner.borrow();
            let offset = inner.offset.unwrap_or_else(|| *self.shared_offset.borrow());
            (inner.id, inner.elements.clone(), offset)
        };
        let current_viewport = self.host.viewport();
        for element in &elements {
            let passes = in_viewport(element.as_ref(), current_viewport, offset);
            let position = self
                .inner
                .borrow()
                .current
                .iter()
                .position(|tracked| Rc::ptr_eq(tracked, element));
            match position {
                None if passes => {
                    trace!("registry {registry_id}: element entered view");
                    self.inner.borrow_mut().current.push(Rc::clone(element));
                    self.emit(EventKind::Enter, element);
                }
                Some(index) if !passes => {
                    trace!("registry {registry_id}: element exited view");
                    self.inner.borrow_mut().current.remove(index);
                    self.emit(EventKind::Exit, element);
                }
                _ => {}
            }
        }
        self
    }

    /// Subscribe `handler` to every future `kind` transition.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> &Self
    where
        F: Fn(&Element) + 'static,
    {
        self.inner
            .borrow_mut()
            .handlers
            .kind_mut(kind)
            .push(Rc::new(handler));
        self
    }

    /// Subscribe `handler` to the next `kind` transition only.
    pub fn once<F>(&self, kind: EventKind, handler: F) -> &Self
    where
        F: Fn(&Element) + 'static,
    {
        self.inner
            .borrow_mut()
            .singles
            .kind_mut(kind)
            .push(Rc::new(handler));
        self
    }

    /// Emit `kind` for `element`. Used internally by [`Registry::check`],
    /// but callable directly.
    ///
    /// One-shot handlers drain first, most recently registered first, each
    /// removed the instant it fires; persistent handlers then run in
    /// reverse registration order. Subscribers observe this ordering, so
    /// it is kept as a compatibility contract.
    pub fn emit(&self, kind: EventKind, element: &Element) -> &Self {
        loop {
            let single = self.inner.borrow_mut().singles.kind_mut(kind).pop();
            match single {
                Some(handler) => handler(element),
                None => break,
            }
        }
        let persistent: HandlerList = self.inner.borrow().handlers.kind(kind).clone();
        for handler in persistent.iter().rev() {
            handler(element);
        }
        self
    }
}
