//! The rulebook: a game's rule registry plus all of its rulesheets.
//!
//! Rulesheets are addressed by their type key and stored densely, so a
//! [`SheetId`] is a plain index. The rulebook is where registration-time
//! decisions are made:
//!
//! - a collision target is classified as component or bitmap by whether a
//!   rulesheet with that key exists *at registration time*,
//! - a combined bitmask is split into per-side or per-axis parts with the
//!   registry's split masks,
//! - a `{this, that}` pair registers the reverse reaction on the target's
//!   own rulesheet,
//! - in strict mode, defining a rulesheet after compilation has begun is an
//!   error, because earlier rules may have classified its key as a tile.

use std::collections::HashMap;

use crate::component::{SheetId, Template};
use crate::context::EntityHook;
use crate::geom::{Axis, Side};
use crate::key::CellKey;
use crate::registry::{RuleRegistrar, RuleRegistry};
use crate::rulesheet::{HitAction, HitRule, MoveAction, MoveRule, Rulesheet, SideRules, TargetKind};
use crate::RuleError;

#[derive(Debug)]
pub struct Rulebook {
    registry: RuleRegistry,
    sheets: Vec<Rulesheet>,
    by_key: HashMap<CellKey, SheetId>,
    strict: bool,
    compiling_began: bool,
}

impl Rulebook {
    pub fn new(registry: RuleRegistry, strict: bool) -> Self {
        Self {
            registry,
            sheets: Vec::new(),
            by_key: HashMap::new(),
            strict,
            compiling_began: false,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Install a rule module. Every rulesheet is dirtied so bitmask rules are
    /// re-expanded against the grown registry.
    pub fn install<M>(&mut self, name: &str, module: M) -> Result<(), RuleError>
    where
        M: FnOnce(&mut RuleRegistrar<'_>) -> Result<(), RuleError>,
    {
        self.registry.install(name, module)?;
        self.dirty_all();
        Ok(())
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Whether any rulesheet has been compiled yet.
    pub fn compiling_began(&self) -> bool {
        self.compiling_began
    }

    // -- sheets ----------------------------------------------------------------

    /// Define a new rulesheet.
    pub fn define(&mut self, key: impl Into<CellKey>, template: Template) -> Result<SheetId, RuleError> {
        let key = key.into();
        if self.by_key.contains_key(&key) {
            return Err(RuleError::DuplicateSheet { key });
        }
        if self.strict && self.compiling_began {
            return Err(RuleError::StaleCompilation { key });
        }
        let id = SheetId(self.sheets.len() as u32);
        tracing::debug!(sheet = %key, id = id.index(), "defined rulesheet");
        self.by_key.insert(key.clone(), id);
        self.sheets.push(Rulesheet::new(key, template));
        Ok(id)
    }

    pub fn id(&self, key: &CellKey) -> Option<SheetId> {
        self.by_key.get(key).copied()
    }

    /// Like [`id`](Self::id), failing with `UnregisteredType`.
    pub fn require(&self, key: &CellKey) -> Result<SheetId, RuleError> {
        self.id(key)
            .ok_or_else(|| RuleError::UnregisteredType { key: key.clone() })
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Panics if `id` did not come from this rulebook.
    pub fn sheet(&self, id: SheetId) -> &Rulesheet {
        &self.sheets[id.index()]
    }

    pub fn get(&self, key: &CellKey) -> Option<&Rulesheet> {
        self.id(key).map(|id| self.sheet(id))
    }

    pub fn sheets(&self) -> &[Rulesheet] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn template(&self, key: &CellKey) -> Result<&Template, RuleError> {
        let id = self.require(key)?;
        Ok(self.sheet(id).template())
    }

    pub fn set_template(&mut self, key: &CellKey, template: Template) -> Result<(), RuleError> {
        let id = self.require(key)?;
        self.sheets[id.index()].set_template(template);
        Ok(())
    }

    fn sheet_mut(&mut self, key: &CellKey) -> Result<&mut Rulesheet, RuleError> {
        let id = self.require(key)?;
        Ok(&mut self.sheets[id.index()])
    }

    // -- rules -----------------------------------------------------------------

    /// Register how rulesheet `this` reacts when it touches `target`.
    ///
    /// Re-registering the same target replaces its previous reaction.
    pub fn on_hit(
        &mut self,
        this: impl Into<CellKey>,
        target: impl Into<CellKey>,
        rule: HitRule,
    ) -> Result<(), RuleError> {
        let this = this.into();
        let target = target.into();
        self.require(&this)?;

        let sides = match rule {
            HitRule::Bits(bits) => {
                let mut sides = SideRules::default();
                for side in Side::ALL {
                    let part = self.registry.collision().split(bits, side);
                    if part != 0 {
                        sides.set(side, Some(HitAction::Bits(part)));
                    }
                }
                sides
            }
            HitRule::Sides(sides) => sides,
            HitRule::Pair { this: mine, that } => {
                if mine.is_none() && that.is_none() {
                    return Err(RuleError::MissingData {
                        sheet: this,
                        what: "collision",
                    });
                }
                let has_mine = mine.is_some();
                if let Some(mine) = mine {
                    self.on_hit(this.clone(), target.clone(), *mine)?;
                }
                if let Some(that) = that {
                    if self.contains(&target) {
                        self.on_hit(target, this, *that)?;
                    } else if has_mine {
                        tracing::warn!(
                            sheet = %this,
                            target = %target,
                            "ignoring reverse reaction: target is not a rulesheet"
                        );
                    } else {
                        // Only a reverse reaction was given and it has nowhere to go.
                        return Err(RuleError::MissingData {
                            sheet: this,
                            what: "collision",
                        });
                    }
                }
                return Ok(());
            }
        };

        let kind = if self.contains(&target) {
            TargetKind::Component
        } else {
            TargetKind::Bitmap
        };
        let sheet = self.sheet_mut(&this)?;
        if !sheet.set_collision(target, sides, kind) {
            return Err(RuleError::MissingData {
                sheet: this,
                what: "collision",
            });
        }
        Ok(())
    }

    /// Set movement selectors for rulesheet `this`. Axes left empty keep
    /// their previous selector.
    pub fn movement(&mut self, this: impl Into<CellKey>, rule: MoveRule) -> Result<(), RuleError> {
        let this = this.into();
        let (x, y) = match rule {
            MoveRule::Bits(bits) => {
                let part = |axis| {
                    let b = self.registry.movement().split(bits, axis);
                    (b != 0).then_some(MoveAction::Bits(b))
                };
                (part(Axis::X), part(Axis::Y))
            }
            MoveRule::Axes { x, y } => (x, y),
        };

        let sheet = self.sheet_mut(&this)?;
        let mut applied = false;
        if let Some(x) = x {
            applied |= sheet.set_movement(Axis::X, x);
        }
        if let Some(y) = y {
            applied |= sheet.set_movement(Axis::Y, y);
        }
        if !applied {
            return Err(RuleError::MissingData {
                sheet: this,
                what: "movement",
            });
        }
        Ok(())
    }

    /// Make rulesheet `this` track the nearest live entity of type `target`
    /// and, when the registry defines a `follow` rule, move with it on both
    /// axes.
    pub fn follow(&mut self, this: impl Into<CellKey>, target: impl Into<CellKey>) -> Result<(), RuleError> {
        let this = this.into();
        let target = target.into();
        self.require(&target)?;

        let movement = self.registry.movement();
        let follow = movement.lookup("follow").unwrap_or(0);
        let parts = Axis::ORDER.map(|axis| (axis, movement.split(follow, axis)));

        let sheet = self.sheet_mut(&this)?;
        sheet.set_follow(target);
        for (axis, part) in parts {
            if part != 0 {
                sheet.set_movement(axis, MoveAction::Bits(part));
            }
        }
        Ok(())
    }

    pub fn on_tick(&mut self, this: impl Into<CellKey>, hook: EntityHook) -> Result<(), RuleError> {
        self.sheet_mut(&this.into())?.on_tick(hook);
        Ok(())
    }

    pub fn on_destroy(&mut self, this: impl Into<CellKey>, hook: EntityHook) -> Result<(), RuleError> {
        self.sheet_mut(&this.into())?.on_destroy(hook);
        Ok(())
    }

    // -- compilation -----------------------------------------------------------

    /// Compile every dirty rulesheet. Returns how many were compiled.
    pub fn compile_all(&mut self) -> usize {
        let mut compiled = 0;
        for sheet in &mut self.sheets {
            if sheet.compile(&self.registry) {
                compiled += 1;
            }
        }
        self.compiling_began |= compiled > 0;
        compiled
    }

    fn dirty_all(&mut self) {
        for sheet in &mut self.sheets {
            sheet.mark_dirty();
        }
    }
}
