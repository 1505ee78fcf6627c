//! Rulesheets: declared movement and collision rules for one entity type.
//!
//! A [`Rulesheet`] owns the rules as declared (per neighbor key, per side)
//! and the [`CompiledSheet`] built from them. Every rule mutation goes
//! through a method that sets the dirty flag; [`Rulesheet::compile`]
//! rebuilds the dispatch tables only when dirty and clears the flag.
//!
//! Collision rules are split into two sub-tables by what the neighbor key
//! was when the rule was registered:
//!
//! - **bitmap**: the key was not a rulesheet, so it is matched against level
//!   cells,
//! - **component**: the key was a rulesheet, so it is matched against live
//!   entities of that type.
//!
//! The classification is taken at registration time and never revisited.

use std::collections::HashMap;
use std::fmt;

use crate::compile::{self, CompiledSheet};
use crate::component::Template;
use crate::context::{CollisionCallback, CollisionFn, EntityHook, MovementCallback, MovementFn};
use crate::geom::{Axis, Side};
use crate::key::CellKey;
use crate::registry::{RuleBits, RuleRegistry};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// What one side of a collision rule does.
#[derive(Clone)]
pub enum HitAction {
    /// Built-in or registered behaviors, expanded in ascending bit order.
    Bits(RuleBits),
    /// A fragment run with the full [`Contact`](crate::context::Contact).
    Inline(CollisionFn),
    /// A callback run with `(entity, key, bounds, neighbor)`.
    Callback(CollisionCallback),
}

impl HitAction {
    fn is_empty(&self) -> bool {
        matches!(self, HitAction::Bits(0))
    }
}

impl fmt::Debug for HitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitAction::Bits(b) => write!(f, "Bits({b:#x})"),
            HitAction::Inline(_) => f.write_str("Inline(..)"),
            HitAction::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// What one axis of a movement rule does.
#[derive(Clone)]
pub enum MoveAction {
    Bits(RuleBits),
    Inline(MovementFn),
    Callback(MovementCallback),
}

impl MoveAction {
    fn is_empty(&self) -> bool {
        matches!(self, MoveAction::Bits(0))
    }
}

impl fmt::Debug for MoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveAction::Bits(b) => write!(f, "Bits({b:#x})"),
            MoveAction::Inline(_) => f.write_str("Inline(..)"),
            MoveAction::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule specs
// ---------------------------------------------------------------------------

/// Per-side collision reactions against one neighbor key.
#[derive(Debug, Clone, Default)]
pub struct SideRules {
    pub top: Option<HitAction>,
    pub right: Option<HitAction>,
    pub bottom: Option<HitAction>,
    pub left: Option<HitAction>,
}

impl SideRules {
    pub fn get(&self, side: Side) -> Option<&HitAction> {
        match side {
            Side::Top => self.top.as_ref(),
            Side::Right => self.right.as_ref(),
            Side::Bottom => self.bottom.as_ref(),
            Side::Left => self.left.as_ref(),
        }
    }

    pub fn set(&mut self, side: Side, action: Option<HitAction>) {
        let slot = match side {
            Side::Top => &mut self.top,
            Side::Right => &mut self.right,
            Side::Bottom => &mut self.bottom,
            Side::Left => &mut self.left,
        };
        *slot = action;
    }

    /// The same action on all four sides.
    pub fn all(action: HitAction) -> Self {
        Self {
            top: Some(action.clone()),
            right: Some(action.clone()),
            bottom: Some(action.clone()),
            left: Some(action),
        }
    }

    /// True when no side carries a usable action.
    pub fn is_empty(&self) -> bool {
        Side::ALL
            .iter()
            .all(|s| self.get(*s).map_or(true, HitAction::is_empty))
    }

    /// Drop empty bitmask sides.
    fn pruned(mut self) -> Self {
        for side in Side::ALL {
            if self.get(side).is_some_and(HitAction::is_empty) {
                self.set(side, None);
            }
        }
        self
    }
}

/// A collision rule as registered through
/// [`Rulebook::on_hit`](crate::rulebook::Rulebook::on_hit).
#[derive(Debug, Clone)]
pub enum HitRule {
    /// One combined mask, split per side with the registry's side masks.
    Bits(RuleBits),
    /// Explicit per-side actions.
    Sides(SideRules),
    /// `this` configures the registering sheet; `that` configures the
    /// neighbor's reaction back, when the neighbor is itself a rulesheet.
    Pair {
        this: Option<Box<HitRule>>,
        that: Option<Box<HitRule>>,
    },
}

impl HitRule {
    pub fn pair(this: Option<HitRule>, that: Option<HitRule>) -> Self {
        HitRule::Pair {
            this: this.map(Box::new),
            that: that.map(Box::new),
        }
    }
}

/// A movement rule as registered through
/// [`Rulebook::movement`](crate::rulebook::Rulebook::movement).
///
/// Only non-empty axes overwrite the sheet's current selector.
#[derive(Debug, Clone)]
pub enum MoveRule {
    /// One combined mask, split per axis with the registry's axis masks.
    Bits(RuleBits),
    Axes {
        x: Option<MoveAction>,
        y: Option<MoveAction>,
    },
}

/// How a neighbor key was classified when its rule was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Static level cells.
    Bitmap,
    /// Live entities of another (or the same) rulesheet.
    Component,
}

// ---------------------------------------------------------------------------
// Rulesheet
// ---------------------------------------------------------------------------

/// Declared and compiled rules for one entity type.
pub struct Rulesheet {
    key: CellKey,
    template: Template,
    dirty: bool,
    is_static: bool,
    bitmap: HashMap<CellKey, SideRules>,
    component: HashMap<CellKey, SideRules>,
    move_x: Option<MoveAction>,
    move_y: Option<MoveAction>,
    follow: Option<CellKey>,
    tick_hook: Option<EntityHook>,
    destroy_hook: Option<EntityHook>,
    compiled: CompiledSheet,
}

impl Rulesheet {
    /// A new, static, dirty rulesheet with no rules.
    pub fn new(key: CellKey, template: Template) -> Self {
        Self {
            key,
            template,
            dirty: true,
            is_static: true,
            bitmap: HashMap::new(),
            component: HashMap::new(),
            move_x: None,
            move_y: None,
            follow: None,
            tick_hook: None,
            destroy_hook: None,
            compiled: CompiledSheet::default(),
        }
    }

    pub fn key(&self) -> &CellKey {
        &self.key
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Replace the spawn template. Already-live entities keep their values.
    pub fn set_template(&mut self, template: Template) {
        self.template = template;
    }

    /// Compiled tables are stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// No movement or follow rule has been registered.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Declared rules against level cells.
    pub fn bitmap_rules(&self) -> &HashMap<CellKey, SideRules> {
        &self.bitmap
    }

    /// Declared rules against live entities.
    pub fn component_rules(&self) -> &HashMap<CellKey, SideRules> {
        &self.component
    }

    pub fn has_collision_rules(&self) -> bool {
        !self.bitmap.is_empty() || !self.component.is_empty()
    }

    pub fn move_rule(&self, axis: Axis) -> Option<&MoveAction> {
        match axis {
            Axis::X => self.move_x.as_ref(),
            Axis::Y => self.move_y.as_ref(),
        }
    }

    /// The type key this sheet tracks for follow movement.
    pub fn follow_target(&self) -> Option<&CellKey> {
        self.follow.as_ref()
    }

    pub fn tick_hook(&self) -> Option<&EntityHook> {
        self.tick_hook.as_ref()
    }

    pub fn destroy_hook(&self) -> Option<&EntityHook> {
        self.destroy_hook.as_ref()
    }

    // -- mutators (all set dirty) --------------------------------------------

    /// Replace the collision reaction against `target`. Returns `false`
    /// (and changes nothing) when every side is empty.
    pub fn set_collision(&mut self, target: CellKey, rules: SideRules, kind: TargetKind) -> bool {
        let rules = rules.pruned();
        if rules.is_empty() {
            return false;
        }
        let (table, other) = match kind {
            TargetKind::Bitmap => (&mut self.bitmap, &mut self.component),
            TargetKind::Component => (&mut self.component, &mut self.bitmap),
        };
        other.remove(&target);
        table.insert(target, rules);
        self.dirty = true;
        true
    }

    /// Set the movement selector for one axis. Returns `false` (and changes
    /// nothing) for an empty selector.
    pub fn set_movement(&mut self, axis: Axis, action: MoveAction) -> bool {
        if action.is_empty() {
            return false;
        }
        match axis {
            Axis::X => self.move_x = Some(action),
            Axis::Y => self.move_y = Some(action),
        }
        self.is_static = false;
        self.dirty = true;
        true
    }

    /// Track the nearest live entity of type `target` each tick.
    pub fn set_follow(&mut self, target: CellKey) {
        self.follow = Some(target);
        self.is_static = false;
        self.dirty = true;
    }

    /// Hook run on each entity at the start of its update.
    pub fn on_tick(&mut self, hook: EntityHook) {
        self.tick_hook = Some(hook);
        self.dirty = true;
    }

    /// Hook run once on each entity as it dies.
    pub fn on_destroy(&mut self, hook: EntityHook) {
        self.destroy_hook = Some(hook);
        self.dirty = true;
    }

    // -- compilation ---------------------------------------------------------

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Rebuild the dispatch tables if dirty. Returns whether anything was
    /// compiled.
    pub fn compile(&mut self, registry: &RuleRegistry) -> bool {
        if !self.dirty {
            return false;
        }
        let revision = self.compiled.revision() + 1;
        self.compiled = compile::compile_sheet(self, registry, revision);
        self.dirty = false;
        tracing::debug!(
            sheet = %self.key,
            revision,
            tile_branches_y = self.compiled.tiles(Axis::Y).len(),
            tile_branches_x = self.compiled.tiles(Axis::X).len(),
            entity_branches_y = self.compiled.entities(Axis::Y).len(),
            entity_branches_x = self.compiled.entities(Axis::X).len(),
            "compiled rulesheet"
        );
        true
    }

    /// The compiled tables. Stale while [`is_dirty`](Self::is_dirty).
    pub fn compiled(&self) -> &CompiledSheet {
        &self.compiled
    }
}

impl fmt::Debug for Rulesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rulesheet")
            .field("key", &self.key)
            .field("dirty", &self.dirty)
            .field("is_static", &self.is_static)
            .field("bitmap", &self.bitmap)
            .field("component", &self.component)
            .field("move_x", &self.move_x)
            .field("move_y", &self.move_y)
            .field("follow", &self.follow)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
