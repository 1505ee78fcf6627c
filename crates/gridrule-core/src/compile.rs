//! Rulesheet compiler.
//!
//! Turns a [`Rulesheet`]'s declared rules into a [`CompiledSheet`]:
//!
//! - two tile dispatch tables (Y, X) built from the bitmap rules,
//! - two entity dispatch tables (Y, X) built from the component rules,
//! - two movement routines (X, Y) built from the movement selectors.
//!
//! A dispatch table holds one [`Branch`] per neighbor key that has a
//! non-empty reaction on at least one side of that axis. Keys the sheet
//! never reacts to get no branch, so dispatching on them is a map miss.
//! Each branch picks its near or far routine by comparing centers on the
//! axis: mover center strictly less than neighbor center fires the near
//! side (`Top` on Y, `Left` on X), anything else fires the far side.
//!
//! Bitmask actions expand to their native fragments in ascending bit order;
//! inline fragments are used as-is; callbacks are wrapped into a fragment
//! that unpacks the [`Contact`] into the callback's arguments.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::{CollisionFn, Contact, Motion, MovementFn};
use crate::geom::{Aabb, Axis, Side};
use crate::key::CellKey;
use crate::registry::RuleRegistry;
use crate::rulesheet::{HitAction, MoveAction, Rulesheet, SideRules};

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

/// An ordered list of collision fragments run against one contact.
#[derive(Clone, Default)]
pub struct Routine(Vec<CollisionFn>);

impl Routine {
    pub fn run(&self, contact: &mut Contact<'_>) {
        for fragment in &self.0 {
            fragment(contact);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Routine({} fragments)", self.0.len())
    }
}

/// An ordered list of movement fragments run for one axis.
#[derive(Clone, Default)]
pub struct MoveRoutine(Vec<MovementFn>);

impl MoveRoutine {
    pub fn run(&self, motion: &mut Motion<'_>) {
        for fragment in &self.0 {
            fragment(motion);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for MoveRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MoveRoutine({} fragments)", self.0.len())
    }
}

// ---------------------------------------------------------------------------
// Branch / DispatchTable
// ---------------------------------------------------------------------------

/// Near/far reaction to one neighbor key on one axis.
#[derive(Debug, Clone, Default)]
pub struct Branch {
    /// `Top` on Y, `Left` on X.
    pub near: Option<Routine>,
    /// `Bottom` on Y, `Right` on X.
    pub far: Option<Routine>,
}

impl Branch {
    /// Pick the routine for a contact between `mover` and `other` on `axis`.
    pub fn select(&self, axis: Axis, mover: &Aabb, other: &Aabb) -> Option<(Side, &Routine)> {
        if mover.center(axis) < other.center(axis) {
            self.near.as_ref().map(|r| (Side::near(axis), r))
        } else {
            self.far.as_ref().map(|r| (Side::far(axis), r))
        }
    }
}

/// Per-key branches for one axis.
pub type DispatchTable = HashMap<CellKey, Branch>;

// ---------------------------------------------------------------------------
// CompiledSheet
// ---------------------------------------------------------------------------

/// Everything the integrator needs to run one rulesheet.
#[derive(Debug, Clone, Default)]
pub struct CompiledSheet {
    /// Indexed by [`Axis::index`].
    tiles: [DispatchTable; 2],
    entities: [DispatchTable; 2],
    moves: [Option<MoveRoutine>; 2],
    follow: Option<CellKey>,
    revision: u64,
}

impl CompiledSheet {
    pub fn tiles(&self, axis: Axis) -> &DispatchTable {
        &self.tiles[axis.index()]
    }

    pub fn entities(&self, axis: Axis) -> &DispatchTable {
        &self.entities[axis.index()]
    }

    pub fn movement(&self, axis: Axis) -> Option<&MoveRoutine> {
        self.moves[axis.index()].as_ref()
    }

    pub fn follow(&self) -> Option<&CellKey> {
        self.follow.as_ref()
    }

    /// Whether the tile scanner runs on this axis.
    pub fn scans_tiles(&self, axis: Axis) -> bool {
        !self.tiles(axis).is_empty()
    }

    /// Whether the pool loop does anything on this axis.
    pub fn scans_pool(&self, axis: Axis) -> bool {
        !self.entities(axis).is_empty() || self.follow.is_some()
    }

    /// Number of times this sheet has been compiled. Zero for a sheet that
    /// has never been compiled.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Build the compiled form of `sheet`.
pub(crate) fn compile_sheet(sheet: &Rulesheet, registry: &RuleRegistry, revision: u64) -> CompiledSheet {
    let mut compiled = CompiledSheet {
        follow: sheet.follow_target().cloned(),
        revision,
        ..Default::default()
    };

    for axis in Axis::ORDER {
        let i = axis.index();
        compiled.tiles[i] = dispatch_table(sheet.bitmap_rules(), axis, registry);
        compiled.entities[i] = dispatch_table(sheet.component_rules(), axis, registry);
        compiled.moves[i] = sheet
            .move_rule(axis)
            .map(|action| move_routine(action, registry))
            .filter(|r| !r.is_empty());
    }

    compiled
}

fn dispatch_table(rules: &HashMap<CellKey, SideRules>, axis: Axis, registry: &RuleRegistry) -> DispatchTable {
    let mut table = DispatchTable::new();
    for (key, sides) in rules {
        let near = sides.get(Side::near(axis)).and_then(|a| routine(a, registry));
        let far = sides.get(Side::far(axis)).and_then(|a| routine(a, registry));
        if near.is_some() || far.is_some() {
            table.insert(key.clone(), Branch { near, far });
        }
    }
    table
}

fn routine(action: &HitAction, registry: &RuleRegistry) -> Option<Routine> {
    let fragments: Vec<CollisionFn> = match action {
        HitAction::Bits(bits) => registry.collision().fragments(*bits).cloned().collect(),
        HitAction::Inline(f) => vec![f.clone()],
        HitAction::Callback(cb) => {
            let cb = cb.clone();
            let wrapped: CollisionFn = Arc::new(move |c: &mut Contact<'_>| {
                cb(&mut *c.entity, c.key, c.other, c.neighbor.as_deref_mut());
            });
            vec![wrapped]
        }
    };
    (!fragments.is_empty()).then(|| Routine(fragments))
}

fn move_routine(action: &MoveAction, registry: &RuleRegistry) -> MoveRoutine {
    let fragments: Vec<MovementFn> = match action {
        MoveAction::Bits(bits) => registry.movement().fragments(*bits).cloned().collect(),
        MoveAction::Inline(f) => vec![f.clone()],
        MoveAction::Callback(cb) => {
            let cb = cb.clone();
            let wrapped: MovementFn = Arc::new(move |m: &mut Motion<'_>| {
                cb(&mut *m.entity, m.axis, m.controls);
            });
            vec![wrapped]
        }
    };
    MoveRoutine(fragments)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
