//! Bitmask rule registry.
//!
//! Every named movement or collision behavior owns one bit of a
//! [`RuleBits`] mask. A rulesheet selects behaviors by OR-ing bits together;
//! the compiler later expands a mask back into the behavior fragments it
//! names, in ascending bit order.
//!
//! The registry keeps two independent namespaces ([`Namespace::Collision`]
//! and [`Namespace::Movement`]), each a [`RuleTable`] with:
//!
//! - a monotonically growing bit counter (the Nth implicitly assigned rule
//!   gets `1 << N`),
//! - a name table (names are case-insensitive and normalized to
//!   `[a-z0-9_]`),
//! - shorthands: named ORs of other rules, append-only when edited,
//! - per-side (collision) or per-axis (movement) masks used to split one
//!   combined mask into its per-side components.
//!
//! Unknown names inside shorthand and mask composition are skipped, not
//! errors.
//!
//! # Width
//!
//! [`RuleBits`] is a `u128`, so each namespace holds at most
//! [`MAX_RULES`] distinct rules.
//!
//! # Example
//!
//! ```
//! use gridrule_core::prelude::*;
//! use std::sync::Arc;
//!
//! let mut registry = RuleRegistry::new();
//! let mut rules = registry.registrar();
//! let a = rules
//!     .define_movement("A", BehaviorCode::Native(Arc::new(|m: &mut Motion<'_>| m.entity.x += 1.0)), None)
//!     .unwrap();
//! let b = rules
//!     .define_movement("B", BehaviorCode::Native(Arc::new(|m: &mut Motion<'_>| m.entity.x += 2.0)), None)
//!     .unwrap();
//! let ab = rules.movement_shorthand("AB", &["a", "b"]).unwrap();
//! assert_eq!((a, b, ab), (0b01, 0b10, 0b11));
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use crate::context::{CollisionFn, MovementFn};
use crate::geom::{Axis, Side};
use crate::RuleError;

/// A set of rule bits.
pub type RuleBits = u128;

/// Maximum number of distinct rules per namespace.
pub const MAX_RULES: u32 = RuleBits::BITS;

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// Which rule table a name or bit belongs to. Bits are meaningless across
/// namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Collision,
    Movement,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Collision => f.write_str("collision"),
            Namespace::Movement => f.write_str("movement"),
        }
    }
}

// ---------------------------------------------------------------------------
// MaskSlot
// ---------------------------------------------------------------------------

/// A selector for one of a namespace's accumulating split masks.
pub trait MaskSlot: Copy + fmt::Debug {
    /// Number of masks in the namespace.
    const COUNT: usize;
    fn slot(self) -> usize;
}

impl MaskSlot for Side {
    const COUNT: usize = 4;
    fn slot(self) -> usize {
        self.index()
    }
}

impl MaskSlot for Axis {
    const COUNT: usize = 2;
    fn slot(self) -> usize {
        self.index()
    }
}

// ---------------------------------------------------------------------------
// BehaviorCode
// ---------------------------------------------------------------------------

/// What a rule bit does when expanded.
#[derive(Clone)]
pub enum BehaviorCode<F> {
    /// A behavior fragment.
    Native(F),
    /// A bit with no behavior of its own (markers, side-mask placeholders).
    Reserved,
}

impl<F> fmt::Debug for BehaviorCode<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviorCode::Native(_) => f.write_str("Native(..)"),
            BehaviorCode::Reserved => f.write_str("Reserved"),
        }
    }
}

/// Normalize a rule name: trimmed, lowercased, anything outside
/// `[A-Za-z0-9_]` replaced by `_`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// RuleTable
// ---------------------------------------------------------------------------

/// One namespace of the registry.
pub struct RuleTable<F, S: MaskSlot> {
    namespace: Namespace,
    names: HashMap<String, RuleBits>,
    shorthands: HashSet<String>,
    /// Behaviors keyed by bit position.
    behaviors: BTreeMap<u32, BehaviorCode<F>>,
    /// Next implicit bit position.
    count: u32,
    masks: Vec<RuleBits>,
    _slot: PhantomData<S>,
}

/// Collision namespace, split by [`Side`].
pub type CollisionTable = RuleTable<CollisionFn, Side>;

/// Movement namespace, split by [`Axis`].
pub type MovementTable = RuleTable<MovementFn, Axis>;

impl<F, S: MaskSlot> RuleTable<F, S> {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            names: HashMap::new(),
            shorthands: HashSet::new(),
            behaviors: BTreeMap::new(),
            count: 0,
            masks: vec![0; S::COUNT],
            _slot: PhantomData,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Number of bit positions holding a behavior (native or reserved).
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    fn checked_name(&self, name: &str) -> Result<String, RuleError> {
        if name.trim().is_empty() {
            return Err(RuleError::InvalidName {
                namespace: self.namespace,
                name: name.to_owned(),
            });
        }
        let normalized = normalize_name(name);
        if self.names.contains_key(&normalized) {
            return Err(RuleError::DuplicateName {
                namespace: self.namespace,
                name: normalized,
            });
        }
        Ok(normalized)
    }

    /// Define a rule and return its bit.
    ///
    /// With `value = None` the rule takes `1 << count`, skipping positions
    /// already claimed by explicit values. An explicit `value` overrides that
    /// assignment but is stricter than a plain override: it must be a single
    /// bit (`InvalidValue` otherwise) and that bit must not already hold a
    /// behavior (`BitInUse`), so two rules never share a fragment slot.
    pub fn define(
        &mut self,
        name: &str,
        code: BehaviorCode<F>,
        value: Option<RuleBits>,
    ) -> Result<RuleBits, RuleError> {
        let name = self.checked_name(name)?;

        let position = match value {
            Some(value) => {
                if value.count_ones() != 1 {
                    return Err(RuleError::InvalidValue {
                        namespace: self.namespace,
                        name,
                        value,
                    });
                }
                let position = value.trailing_zeros();
                if self.behaviors.contains_key(&position) {
                    return Err(RuleError::BitInUse {
                        namespace: self.namespace,
                        name,
                        bit: value,
                    });
                }
                position
            }
            None => {
                while self.behaviors.contains_key(&self.count) {
                    self.count += 1;
                }
                if self.count >= MAX_RULES {
                    return Err(RuleError::RuleLimit {
                        namespace: self.namespace,
                        limit: MAX_RULES,
                    });
                }
                let position = self.count;
                self.count += 1;
                position
            }
        };

        let bit: RuleBits = 1 << position;
        self.behaviors.insert(position, code);
        self.names.insert(name, bit);
        Ok(bit)
    }

    /// Define a shorthand: the OR of the named rules. Unknown names are
    /// skipped.
    pub fn define_shorthand(&mut self, name: &str, rules: &[&str]) -> Result<RuleBits, RuleError> {
        let name = self.checked_name(name)?;
        if rules.is_empty() {
            return Err(RuleError::EmptyShorthand {
                namespace: self.namespace,
                name,
            });
        }
        let bits = self.bits(rules);
        self.names.insert(name.clone(), bits);
        self.shorthands.insert(name);
        Ok(bits)
    }

    /// OR more rules into an existing shorthand. Never clears bits.
    pub fn edit_shorthand(&mut self, name: &str, rules: &[&str]) -> Result<RuleBits, RuleError> {
        let name = normalize_name(name);
        if !self.shorthands.contains(&name) {
            return Err(RuleError::UnknownShorthand {
                namespace: self.namespace,
                name,
            });
        }
        let extra = self.bits(rules);
        let entry = self.names.entry(name).or_insert(0);
        *entry |= extra;
        Ok(*entry)
    }

    /// OR the named rules into the split mask for `slot`. Unknown names are
    /// skipped.
    pub fn edit_mask(&mut self, slot: S, rules: &[&str]) -> RuleBits {
        let extra = self.bits(rules);
        let mask = &mut self.masks[slot.slot()];
        *mask |= extra;
        *mask
    }

    /// Bits registered under `name` (rule or shorthand).
    pub fn lookup(&self, name: &str) -> Option<RuleBits> {
        self.names.get(&normalize_name(name)).copied()
    }

    /// OR of the named rules; unknown names contribute nothing.
    pub fn bits(&self, rules: &[&str]) -> RuleBits {
        rules
            .iter()
            .filter_map(|r| self.lookup(r))
            .fold(0, |acc, b| acc | b)
    }

    /// The accumulated split mask for `slot`.
    pub fn mask(&self, slot: S) -> RuleBits {
        self.masks[slot.slot()]
    }

    /// The part of `bits` that applies to `slot`.
    pub fn split(&self, bits: RuleBits, slot: S) -> RuleBits {
        bits & self.mask(slot)
    }

    /// Native fragments selected by `bits`, in ascending bit order. Bits with
    /// no behavior and reserved bits yield nothing.
    pub fn fragments(&self, bits: RuleBits) -> impl Iterator<Item = &F> + '_ {
        self.behaviors
            .iter()
            .filter(move |(pos, _)| bits & (1 << **pos) != 0)
            .filter_map(|(_, code)| match code {
                BehaviorCode::Native(f) => Some(f),
                BehaviorCode::Reserved => None,
            })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<F, S: MaskSlot> fmt::Debug for RuleTable<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("namespace", &self.namespace)
            .field("rules", &self.behaviors.len())
            .field("names", &self.names.len())
            .field("masks", &self.masks)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RuleRegistry
// ---------------------------------------------------------------------------

/// Both rule namespaces plus the list of installed rule modules.
#[derive(Debug)]
pub struct RuleRegistry {
    collision: CollisionTable,
    movement: MovementTable,
    modules: Vec<String>,
}

impl RuleRegistry {
    /// An empty registry with no rules at all.
    pub fn new() -> Self {
        Self {
            collision: RuleTable::new(Namespace::Collision),
            movement: RuleTable::new(Namespace::Movement),
            modules: Vec::new(),
        }
    }

    /// A registry with the built-in rule pack installed.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .install("builtin", crate::builtin::install)
            .expect("built-in rule pack should always install into an empty registry");
        registry
    }

    /// Run a rule module against this registry.
    ///
    /// The module only sees a [`RuleRegistrar`], i.e. the registry mutation
    /// operations. A module that fails leaves whatever it defined before the
    /// failure in place.
    pub fn install<M>(&mut self, name: &str, module: M) -> Result<(), RuleError>
    where
        M: FnOnce(&mut RuleRegistrar<'_>) -> Result<(), RuleError>,
    {
        let mut registrar = self.registrar();
        module(&mut registrar)?;
        tracing::debug!(
            module = name,
            collision_rules = self.collision.len(),
            movement_rules = self.movement.len(),
            "installed rule module"
        );
        self.modules.push(name.to_owned());
        Ok(())
    }

    /// Direct registrar access for one-off definitions.
    pub fn registrar(&mut self) -> RuleRegistrar<'_> {
        RuleRegistrar {
            collision: &mut self.collision,
            movement: &mut self.movement,
        }
    }

    pub fn collision(&self) -> &CollisionTable {
        &self.collision
    }

    pub fn movement(&self) -> &MovementTable {
        &self.movement
    }

    /// Names of installed modules, in install order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Shorthand for `self.collision().bits(names)`.
    pub fn collision_bits(&self, names: &[&str]) -> RuleBits {
        self.collision.bits(names)
    }

    /// Shorthand for `self.movement().bits(names)`.
    pub fn movement_bits(&self, names: &[&str]) -> RuleBits {
        self.movement.bits(names)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// RuleRegistrar
// ---------------------------------------------------------------------------

/// The capability handed to rule modules: define rules and shorthands, edit
/// shorthands and split masks. Nothing else about the game is reachable
/// through it.
pub struct RuleRegistrar<'a> {
    collision: &'a mut CollisionTable,
    movement: &'a mut MovementTable,
}

impl RuleRegistrar<'_> {
    pub fn define_collision(
        &mut self,
        name: &str,
        code: BehaviorCode<CollisionFn>,
        value: Option<RuleBits>,
    ) -> Result<RuleBits, RuleError> {
        self.collision.define(name, code, value)
    }

    pub fn define_movement(
        &mut self,
        name: &str,
        code: BehaviorCode<MovementFn>,
        value: Option<RuleBits>,
    ) -> Result<RuleBits, RuleError> {
        self.movement.define(name, code, value)
    }

    pub fn collision_shorthand(&mut self, name: &str, rules: &[&str]) -> Result<RuleBits, RuleError> {
        self.collision.define_shorthand(name, rules)
    }

    pub fn movement_shorthand(&mut self, name: &str, rules: &[&str]) -> Result<RuleBits, RuleError> {
        self.movement.define_shorthand(name, rules)
    }

    pub fn edit_collision_shorthand(
        &mut self,
        name: &str,
        rules: &[&str],
    ) -> Result<RuleBits, RuleError> {
        self.collision.edit_shorthand(name, rules)
    }

    pub fn edit_movement_shorthand(
        &mut self,
        name: &str,
        rules: &[&str],
    ) -> Result<RuleBits, RuleError> {
        self.movement.edit_shorthand(name, rules)
    }

    /// OR rules into a collision side mask.
    pub fn edit_side(&mut self, side: Side, rules: &[&str]) -> RuleBits {
        self.collision.edit_mask(side, rules)
    }

    /// OR rules into a movement axis mask.
    pub fn edit_axis(&mut self, axis: Axis, rules: &[&str]) -> RuleBits {
        self.movement.edit_mask(axis, rules)
    }

    /// Read-only view of the collision namespace (for lookups while
    /// composing).
    pub fn collision(&self) -> &CollisionTable {
        self.collision
    }

    pub fn movement(&self) -> &MovementTable {
        self.movement
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
