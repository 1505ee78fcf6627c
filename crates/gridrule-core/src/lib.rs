//! Gridrule Core -- rule-compiled collision and movement for tile games.
//!
//! Game authors describe each entity type with a [`Rulesheet`]: which
//! movement behaviors drive it and how it reacts when it touches a tile or
//! another entity. Behaviors are selected from a bitmask [`RuleRegistry`],
//! written inline as closures, or supplied as callbacks. Each rulesheet is
//! compiled into per-axis dispatch tables that contain branches only for the
//! neighbor keys it actually reacts to; compilation is lazy and driven by a
//! dirty flag.
//!
//! Every tick each live entity is integrated Y first, then X. After each
//! axis step the entity scans the tile grid under its footprint and the
//! whole entity pool, dispatching the compiled table on every overlap.
//!
//! # Quick Start
//!
//! ```
//! use gridrule_core::prelude::*;
//!
//! let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
//! book.define('@', Template { gravity: 0.1, ..Default::default() }).unwrap();
//! let solid = book.registry().collision_bits(&["solid", "can_jump"]);
//! book.on_hit('@', '#', HitRule::Bits(solid)).unwrap();
//! let platformer = book.registry().movement_bits(&["platformer"]);
//! book.movement('@', MoveRule::Bits(platformer)).unwrap();
//!
//! let level = Level::from_rows(vec![
//!     "@".chars().map(CellKey::from).collect(),
//!     ".".chars().map(CellKey::from).collect(),
//!     "#".chars().map(CellKey::from).collect(),
//! ])
//! .unwrap();
//!
//! let mut pool = EntityPool::new();
//! let id = book.id(&'@'.into()).unwrap();
//! let player = pool.recycle(CellKey::from('@'), id, 0.0, 0.0, book.sheet(id).template());
//!
//! book.compile_all();
//! let frame = Frame { level: Some(&level), controls: &ControlState::IDLE };
//! for _ in 0..30 {
//!     integrate::update(&mut pool, player, book.sheet(id), &frame);
//! }
//! // Landed on the floor tile at row 2.
//! assert_eq!(pool.get(player).unwrap().y, 1.0);
//! ```

#![deny(unsafe_code)]

pub mod builtin;
pub mod compile;
pub mod component;
pub mod context;
pub mod controls;
pub mod geom;
pub mod integrate;
pub mod key;
pub mod level;
pub mod pool;
pub mod registry;
pub mod rulebook;
pub mod rulesheet;
pub mod scan;

use key::CellKey;
use registry::{Namespace, RuleBits};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// The five setup-error categories. All of them are fatal setup bugs, never
/// transient runtime conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed name, value, or rules list.
    Configuration,
    /// Reference to a shorthand that does not exist.
    UnknownReference,
    /// Entity type key with no rulesheet.
    UnregisteredType,
    /// Rulesheet registered after compilation began, in strict mode.
    StaleCompilation,
    /// Collision or movement rule with nothing in it.
    MissingData,
}

/// Errors produced while defining rules and rulesheets.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A rule or shorthand name is empty.
    #[error("{namespace} rule name {name:?} is empty or invalid")]
    InvalidName { namespace: Namespace, name: String },

    /// A rule or shorthand name is already taken in its namespace.
    #[error("{namespace} rule name {name:?} is already registered")]
    DuplicateName { namespace: Namespace, name: String },

    /// A shorthand was defined without any constituent names.
    #[error("{namespace} shorthand {name:?} needs at least one rule name")]
    EmptyShorthand { namespace: Namespace, name: String },

    /// The namespace has run out of bits.
    #[error("{namespace} rules are limited to {limit} distinct bits")]
    RuleLimit { namespace: Namespace, limit: u32 },

    /// An explicit rule value is not a single bit.
    #[error("explicit {namespace} value {value:#x} for {name:?} must be a single bit")]
    InvalidValue {
        namespace: Namespace,
        name: String,
        value: RuleBits,
    },

    /// An explicit rule value names a bit that already holds a behavior.
    #[error("{namespace} bit {bit:#x} requested by {name:?} already holds a behavior")]
    BitInUse {
        namespace: Namespace,
        name: String,
        bit: RuleBits,
    },

    /// `edit_shorthand` on a name that is not a shorthand.
    #[error("unknown {namespace} shorthand {name:?}")]
    UnknownShorthand { namespace: Namespace, name: String },

    /// A rulesheet with this key already exists.
    #[error("rulesheet {key:?} is already defined")]
    DuplicateSheet { key: CellKey },

    /// No rulesheet is registered for this type key.
    #[error("no rulesheet registered for type key {key:?}")]
    UnregisteredType { key: CellKey },

    /// Strict mode: a rulesheet was defined after compilation began, so
    /// earlier collision rules may have classified it as a tile.
    #[error("rulesheet {key:?} defined after compilation began (strict mode)")]
    StaleCompilation { key: CellKey },

    /// A rule was registered with no usable payload.
    #[error("{what} rule for rulesheet {sheet:?} has no usable payload")]
    MissingData { sheet: CellKey, what: &'static str },
}

impl RuleError {
    /// Which taxonomy bucket this error falls in.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuleError::InvalidName { .. }
            | RuleError::DuplicateName { .. }
            | RuleError::EmptyShorthand { .. }
            | RuleError::RuleLimit { .. }
            | RuleError::InvalidValue { .. }
            | RuleError::BitInUse { .. }
            | RuleError::DuplicateSheet { .. } => ErrorKind::Configuration,
            RuleError::UnknownShorthand { .. } => ErrorKind::UnknownReference,
            RuleError::UnregisteredType { .. } => ErrorKind::UnregisteredType,
            RuleError::StaleCompilation { .. } => ErrorKind::StaleCompilation,
            RuleError::MissingData { .. } => ErrorKind::MissingData,
        }
    }
}

pub use level::LevelError;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::compile::{Branch, CompiledSheet, DispatchTable, MoveRoutine, Routine};
    pub use crate::component::{Component, Ghost, SheetId, Template};
    pub use crate::context::{
        CollisionCallback, CollisionFn, Contact, EntityHook, Motion, MovementCallback, MovementFn,
    };
    pub use crate::controls::{ControlState, Controls};
    pub use crate::geom::{Aabb, Axis, Side};
    pub use crate::integrate::{self, Frame};
    pub use crate::key::CellKey;
    pub use crate::level::Level;
    pub use crate::pool::EntityPool;
    pub use crate::registry::{
        BehaviorCode, MaskSlot, Namespace, RuleBits, RuleRegistrar, RuleRegistry, RuleTable,
    };
    pub use crate::rulebook::Rulebook;
    pub use crate::rulesheet::{HitAction, HitRule, MoveAction, MoveRule, Rulesheet, SideRules, TargetKind};
    pub use crate::{ErrorKind, LevelError, RuleError};
}
