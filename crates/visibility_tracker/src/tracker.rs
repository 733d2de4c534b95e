//! The coordinator: aggregates registries under one throttled check loop.

use anyhow::Error;
use log::{debug, trace, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};
use viewport::{Bounded, Offset, OffsetPatch, in_viewport};

use crate::host::{Host, Trigger, TriggerListener};
use crate::registry::{Element, Registry};
use crate::throttle::Throttle;

/// Minimum spacing between visibility check passes.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Input accepted by [`Tracker::observe`]: one element handle or a group.
pub enum ObserveTarget {
    One(Element),
    Many(Vec<Element>),
}

impl From<Element> for ObserveTarget {
    fn from(element: Element) -> Self {
        Self::One(element)
    }
}

impl<T: Bounded + 'static> From<Rc<T>> for ObserveTarget {
    fn from(element: Rc<T>) -> Self {
        Self::One(element)
    }
}

impl From<Vec<Element>> for ObserveTarget {
    fn from(elements: Vec<Element>) -> Self {
        Self::Many(elements)
    }
}

impl From<&[Element]> for ObserveTarget {
    fn from(elements: &[Element]) -> Self {
        Self::Many(elements.to_vec())
    }
}

/// Shared-offset mutation accepted by [`Tracker::set_offset`].
pub enum OffsetUpdate {
    /// Set all four margins to the same value.
    All(f64),
    /// Overwrite only the margins present in the patch.
    Patch(OffsetPatch),
}

impl From<f64> for OffsetUpdate {
    fn from(value: f64) -> Self {
        Self::All(value)
    }
}

impl From<OffsetPatch> for OffsetUpdate {
    fn from(patch: OffsetPatch) -> Self {
        Self::Patch(patch)
    }
}

struct TrackerInner {
    /// Registries keyed by id; ids are assigned from 1 upwards.
    registries: HashMap<u64, Registry>,
    /// Append-only insertion order of ids; defines check order.
    history: Vec<u64>,
    next_id: u64,
    /// One throttle per tracker, shared by every trigger source.
    throttle: Throttle,
    /// Telemetry: completed check passes over all registries.
    checks_run: u64,
}

/// Aggregates element registries under a single throttled check loop fed
/// by host triggers and a shared offset.
///
/// An explicit instance object: independent trackers can coexist, each
/// wired to its own host. Global listeners are installed once at
/// construction and live for the host's lifetime; there is no teardown.
pub struct Tracker {
    inner: Rc<RefCell<TrackerInner>>,
    offset: Rc<RefCell<Offset>>,
    host: Rc<dyn Host>,
    mutations_observed: bool,
}

impl Tracker {
    /// Wire a tracker to `host` with the default check interval.
    pub fn new(host: Rc<dyn Host>) -> Result<Self, Error> {
        Self::with_interval(host, DEFAULT_CHECK_INTERVAL)
    }

    /// Wire a tracker with an explicit throttle interval.
    pub fn with_interval(host: Rc<dyn Host>, interval: Duration) -> Result<Self, Error> {
        let inner = Rc::new(RefCell::new(TrackerInner {
            registries: HashMap::new(),
            history: Vec::new(),
            next_id: 0,
            throttle: Throttle::new(interval),
            checks_run: 0,
        }));
        let listener = Self::trigger_listener(&inner);
        host.install_triggers(Rc::clone(&listener))?;
        let mutations_observed = host.observe_mutations(listener);
        if !mutations_observed {
            warn!("mutation observation unavailable; rechecking on scroll/resize/load only");
        }
        Ok(Self {
            inner,
            offset: Rc::new(RefCell::new(Offset::default())),
            host,
            mutations_observed,
        })
    }

    /// Build the listener handed to the host. Holds a weak handle so a
    /// dropped tracker leaves a no-op listener behind rather than a cycle.
    fn trigger_listener(inner: &Rc<RefCell<TrackerInner>>) -> TriggerListener {
        let weak: Weak<RefCell<TrackerInner>> = Rc::downgrade(inner);
        Rc::new(move |trigger: Trigger| {
            if let Some(strong) = weak.upgrade() {
                trace!("trigger {trigger:?}");
                let admitted = strong.borrow_mut().throttle.on_trigger_at(Instant::now());
                if admitted {
                    Self::check_all(&strong);
                }
            }
        })
    }

    /// Run `check` on every registry in history order, then bump the pass
    /// counter. Borrows are released before registry callbacks run, so
    /// handlers may call back into the tracker.
    fn check_all(inner: &Rc<RefCell<TrackerInner>>) {
        let ordered: Vec<Registry> = {
            let borrowed = inner.borrow();
            borrowed
                .history
                .iter()
                .filter_map(|id| borrowed.registries.get(id).cloned())
                .collect()
        };
        for registry in &ordered {
            registry.check();
        }
        let mut borrowed = inner.borrow_mut();
        borrowed.checks_run = borrowed.checks_run.saturating_add(1);
        trace!(
            "check pass {} over {} registries",
            borrowed.checks_run,
            ordered.len()
        );
    }

    /// Run the pending trailing check once its spacing window has elapsed.
    /// Hosts call this from their tick loop; returns true when a check ran.
    pub fn poll(&self) -> bool {
        self.poll_at(Instant::now())
    }

    /// Clock-injected variant of [`Tracker::poll`].
    pub fn poll_at(&self, now: Instant) -> bool {
        let due = self.inner.borrow_mut().throttle.trailing_due_at(now);
        if due {
            Self::check_all(&self.inner);
        }
        due
    }

    /// Create a registry over `target`, record it in check order and
    /// return it.
    ///
    /// A single handle normalises to a one-element group. Handles that are
    /// not element nodes are filtered out; a group that filters to empty
    /// still yields a registry, it simply never fires.
    pub fn observe(&self, target: impl Into<ObserveTarget>) -> Registry {
        let candidates = match target.into() {
            ObserveTarget::One(element) => vec![element],
            ObserveTarget::Many(elements) => elements,
        };
        let total = candidates.len();
        let elements: Vec<Element> = candidates
            .into_iter()
            .filter(|handle| handle.is_element())
            .collect();
        if elements.len() < total {
            debug!("observe: filtered {} non-element handles", total - elements.len());
        }
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let registry_id = inner.next_id;
        let registry = Registry::new(
            registry_id,
            elements,
            Rc::clone(&self.offset),
            Rc::clone(&self.host),
        );
        inner.registries.insert(registry_id, registry.clone());
        inner.history.push(registry_id);
        registry
    }

    /// Current shared offset.
    pub fn offset(&self) -> Offset {
        *self.offset.borrow()
    }

    /// Mutate the shared offset in place and return the resulting value.
    ///
    /// Every registry without an override sees the new margins on its next
    /// check; the shared cell itself never changes identity.
    pub fn set_offset(&self, update: impl Into<OffsetUpdate>) -> Offset {
        let mut shared = self.offset.borrow_mut();
        match update.into() {
            OffsetUpdate::All(value) => *shared = Offset::uniform(value),
            OffsetUpdate::Patch(patch) => shared.apply(patch),
        }
        *shared
    }

    /// Viewport test for a single element against the shared offset.
    /// Touches no registry state.
    pub fn is(&self, element: &Element) -> bool {
        in_viewport(element.as_ref(), self.host.viewport(), self.offset())
    }

    /// Telemetry: completed check passes over all registries.
    pub fn checks_run(&self) -> u64 {
        self.inner.borrow().checks_run
    }

    /// Telemetry: trigger arrivals coalesced into trailing runs.
    pub fn deferred(&self) -> u64 {
        self.inner.borrow().throttle.deferred()
    }

    /// Whether the host provided mutation observation at construction.
    pub fn mutations_observed(&self) -> bool {
        self.mutations_observed
    }

    /// Number of registries created so far.
    pub fn registry_count(&self) -> usize {
        self.inner.borrow().registries.len()
    }
}
