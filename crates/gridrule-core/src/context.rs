//! Invocation contexts handed to behavior fragments.
//!
//! Collision fragments receive a [`Contact`]: the moving entity, the key and
//! bounds of what it hit, the side that fired, and (for entity-vs-entity
//! contacts) the neighbor itself. Movement fragments receive a [`Motion`]:
//! the entity, the axis being integrated, and the control source.

use std::sync::Arc;

use crate::component::Component;
use crate::controls::Controls;
use crate::geom::{Aabb, Axis, Side};
use crate::key::CellKey;

/// A collision behavior fragment.
pub type CollisionFn = Arc<dyn Fn(&mut Contact<'_>) + Send + Sync>;

/// A movement behavior fragment.
pub type MovementFn = Arc<dyn Fn(&mut Motion<'_>) + Send + Sync>;

/// A collision callback: `(entity, key, other_bounds, neighbor)`.
///
/// `neighbor` is `Some` only for entity-vs-entity contacts.
pub type CollisionCallback =
    Arc<dyn Fn(&mut Component, &CellKey, Aabb, Option<&mut Component>) + Send + Sync>;

/// A movement callback: `(entity, axis, controls)`.
pub type MovementCallback = Arc<dyn Fn(&mut Component, Axis, &dyn Controls) + Send + Sync>;

/// Hook run on a single entity (tick and destroy hooks).
pub type EntityHook = Arc<dyn Fn(&mut Component) + Send + Sync>;

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// One resolved contact between a moving entity and a tile or neighbor.
pub struct Contact<'a> {
    /// The entity whose collision routine is running.
    pub entity: &'a mut Component,
    /// Cell value or neighbor type key.
    pub key: &'a CellKey,
    /// Bounds of the tile or neighbor at dispatch time.
    pub other: Aabb,
    /// Which side of `other` was hit.
    pub side: Side,
    /// The neighbor entity, for entity-vs-entity contacts.
    pub neighbor: Option<&'a mut Component>,
}

impl Contact<'_> {
    pub fn axis(&self) -> Axis {
        self.side.axis()
    }
}

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// One movement step of an entity along one axis.
pub struct Motion<'a> {
    pub entity: &'a mut Component,
    pub axis: Axis,
    pub controls: &'a dyn Controls,
}
