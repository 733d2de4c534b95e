//! Host environment capabilities consumed by the tracker.

use anyhow::Error;
use std::rc::Rc;
use viewport::Viewport;

/// A host occurrence that may have invalidated element visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scroll,
    Resize,
    Load,
    Mutation,
}

/// Callback handed to the host, fired on every trigger occurrence.
pub type TriggerListener = Rc<dyn Fn(Trigger)>;

/// Capabilities the embedding environment provides to a tracker.
///
/// Methods take `&self`: the listener fires re-entrantly from host event
/// dispatch, so implementations keep their wiring behind interior
/// mutability.
pub trait Host {
    /// Size of the visible region at this instant.
    fn viewport(&self) -> Viewport;

    /// Register `listener` for scroll, resize and load events on the
    /// global window. Called exactly once per tracker; there is no
    /// teardown.
    fn install_triggers(&self, listener: TriggerListener) -> Result<(), Error>;

    /// Watch attribute, child-list and subtree mutations of the document
    /// body, firing `listener` on each. Returns `false` when the
    /// environment has no mutation observation facility; visibility is
    /// then only re-evaluated on scroll/resize/load.
    fn observe_mutations(&self, listener: TriggerListener) -> bool {
        drop(listener);
        false
    }
}
