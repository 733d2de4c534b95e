//! Viewport geometry and the element visibility predicate.
//!
//! The predicate is a pure function of an element's bounding box, the
//! viewport size and a per-side [`Offset`]. Elements are abstracted behind
//! the [`Bounded`] capability so callers (and test doubles) never need a
//! real document.

mod geometry;
mod offset;

pub use geometry::{Rect, Viewport};
pub use offset::{Offset, OffsetPatch};

/// Capability implemented by anything whose viewport visibility can be
/// tested.
pub trait Bounded {
    /// Bounding rectangle in viewport coordinates, or `None` when the
    /// element is detached from the document.
    fn bounding_box(&self) -> Option<Rect>;

    /// Whether this handle refers to an element node. Handles answering
    /// `false` are filtered out before tracking.
    fn is_element(&self) -> bool {
        true
    }
}

/// Test whether `element` intersects the viewport contracted by `offset`.
///
/// The overlap on every side must strictly exceed its margin, so an
/// element exactly on an edge does not pass. A detached element never
/// passes; that is not an error condition.
pub fn in_viewport(element: &dyn Bounded, viewport: Viewport, offset: Offset) -> bool {
    let Some(rect) = element.bounding_box() else {
        return false;
    };
    rect.bottom > offset.top
        && viewport.width - rect.left > offset.right
        && viewport.height - rect.top > offset.bottom
        && rect.right > offset.left
}
