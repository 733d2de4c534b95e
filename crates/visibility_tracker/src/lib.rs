//! Throttled viewport-visibility tracking.
//!
//! A [`Tracker`] owns a set of element groups ([`Registry`]) and re-checks
//! them all behind one rate limiter whenever the host reports a scroll,
//! resize, load or DOM-mutation trigger. Each registry detects in-view
//! transitions for its elements and dispatches enter/exit callbacks
//! synchronously.
//!
//! The model is single-threaded and cooperative: all state lives behind
//! `Rc`/`RefCell`, and nothing here is `Send`. Elements are abstracted
//! behind the [`Bounded`] capability, the environment behind [`Host`], so
//! the whole crate is testable without a document.

mod host;
mod registry;
mod throttle;
mod tracker;

pub use host::{Host, Trigger, TriggerListener};
pub use registry::{Element, EventKind, Handler, Registry};
pub use throttle::Throttle;
pub use tracker::{DEFAULT_CHECK_INTERVAL, ObserveTarget, OffsetUpdate, Tracker};

pub use viewport::{Bounded, Offset, OffsetPatch, Rect, Viewport};
