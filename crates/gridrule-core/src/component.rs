//! Live entity state.
//!
//! A [`Component`] is one simulated entity: position, size, velocity,
//! movement parameters, health, death flag, four generic flags, and the
//! follow-target [`Ghost`]. Every component points back at the rulesheet
//! ([`SheetId`]) that drives it. Components are never deallocated; a dead
//! component is re-initialized in place from its rulesheet's [`Template`]
//! when the pool recycles its slot.

use serde::{Deserialize, Serialize};

use crate::geom::{Aabb, Axis};
use crate::key::CellKey;

// ---------------------------------------------------------------------------
// SheetId
// ---------------------------------------------------------------------------

/// Index of a rulesheet inside its [`Rulebook`](crate::rulebook::Rulebook).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetId(pub(crate) u32);

impl SheetId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// Origin values a rulesheet declares for the entities it spawns.
///
/// Every spawn and every recycle resets a component to these values (plus
/// the spawn position).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    /// Width in cells.
    pub width: f64,
    /// Height in cells.
    pub height: f64,
    /// Initial horizontal velocity.
    pub vx: f64,
    /// Initial vertical velocity.
    pub vy: f64,
    /// Horizontal acceleration per tick under control/follow.
    pub accel_x: f64,
    /// Vertical acceleration per tick under control/follow.
    pub accel_y: f64,
    /// Horizontal speed cap.
    pub max_vx: f64,
    /// Vertical speed cap.
    pub max_vy: f64,
    /// Signed gravity; positive pulls toward +Y.
    pub gravity: f64,
    /// Velocity multiplier applied by the friction rules.
    pub friction: f64,
    /// Jump impulse, applied against gravity.
    pub jump: f64,
    /// Patrol displacement from origin before reversing.
    pub patrol: f64,
    pub health: f64,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            vx: 0.0,
            vy: 0.0,
            accel_x: 0.05,
            accel_y: 0.05,
            max_vx: 0.25,
            max_vy: 0.5,
            gravity: 0.0,
            friction: 0.8,
            jump: 0.45,
            patrol: 3.0,
            health: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Ghost
// ---------------------------------------------------------------------------

/// Snapshot of a follow target: its bounds and squared center distance at
/// the time it was tracked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ghost {
    pub bounds: Aabb,
    pub dist_sq: f64,
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A live (or dead, awaiting recycle) entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Entity type key (the key of the driving rulesheet).
    pub key: CellKey,
    /// The driving rulesheet.
    pub sheet: SheetId,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub vx: f64,
    pub vy: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub max_vx: f64,
    pub max_vy: f64,
    pub gravity: f64,
    pub friction: f64,
    pub jump: f64,
    pub patrol: f64,
    pub health: f64,
    pub dead: bool,
    /// Set by the `can_jump` collision rule, consumed by `control_y`.
    pub can_jump: bool,
    /// Generic flags set by `flag1`..`flag4`.
    pub flags: [bool; 4],
    pub origin_x: f64,
    pub origin_y: f64,
    /// Spawned by a level load (reset rather than killed on level reset).
    pub from_level: bool,
    /// Follow target seen last tick.
    pub ghost: Option<Ghost>,
    /// Nearest follow candidate seen so far this tick.
    #[serde(skip)]
    pub(crate) tracked: Option<Ghost>,
}

impl Component {
    /// Build a fresh component at `(x, y)` from a template.
    pub fn spawn(key: CellKey, sheet: SheetId, x: f64, y: f64, template: &Template) -> Self {
        let mut c = Self {
            key,
            sheet,
            x,
            y,
            w: 0.0,
            h: 0.0,
            vx: 0.0,
            vy: 0.0,
            accel_x: 0.0,
            accel_y: 0.0,
            max_vx: 0.0,
            max_vy: 0.0,
            gravity: 0.0,
            friction: 0.0,
            jump: 0.0,
            patrol: 0.0,
            health: 0.0,
            dead: false,
            can_jump: false,
            flags: [false; 4],
            origin_x: x,
            origin_y: y,
            from_level: false,
            ghost: None,
            tracked: None,
        };
        c.apply_template(template);
        c
    }

    /// Re-initialize this slot in place for a new entity.
    pub fn reinit(&mut self, key: CellKey, sheet: SheetId, x: f64, y: f64, template: &Template) {
        self.key = key;
        self.sheet = sheet;
        self.origin_x = x;
        self.origin_y = y;
        self.from_level = false;
        self.reset(template);
    }

    /// Reset to origin and template values, keeping type and origin.
    pub fn reset(&mut self, template: &Template) {
        self.x = self.origin_x;
        self.y = self.origin_y;
        self.dead = false;
        self.can_jump = false;
        self.flags = [false; 4];
        self.ghost = None;
        self.tracked = None;
        self.apply_template(template);
    }

    fn apply_template(&mut self, t: &Template) {
        self.w = t.width;
        self.h = t.height;
        self.vx = t.vx;
        self.vy = t.vy;
        self.accel_x = t.accel_x;
        self.accel_y = t.accel_y;
        self.max_vx = t.max_vx;
        self.max_vy = t.max_vy;
        self.gravity = t.gravity;
        self.friction = t.friction;
        self.jump = t.jump;
        self.patrol = t.patrol;
        self.health = t.health;
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.w, self.h)
    }

    /// Dead, or out of health and about to be marked dead.
    #[inline]
    pub fn is_dying(&self) -> bool {
        self.dead || self.health <= 0.0
    }

    // -- per-axis accessors used by axis-generic behaviors -------------------

    pub fn pos(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn pos_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    pub fn vel(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.vx,
            Axis::Y => self.vy,
        }
    }

    pub fn vel_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.vx,
            Axis::Y => &mut self.vy,
        }
    }

    pub fn accel(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.accel_x,
            Axis::Y => self.accel_y,
        }
    }

    pub fn max_speed(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.max_vx,
            Axis::Y => self.max_vy,
        }
    }

    pub fn origin(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.origin_x,
            Axis::Y => self.origin_y,
        }
    }

    /// Size along an axis.
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.w,
            Axis::Y => self.h,
        }
    }

    // -- follow tracking -----------------------------------------------------

    /// Offer `other` as this tick's follow candidate. Kept only when strictly
    /// closer than the current candidate, so ties keep the first offered.
    pub(crate) fn track(&mut self, other: Aabb) {
        let dist_sq = self.bounds().dist_sq(&other);
        let closer = match &self.tracked {
            Some(g) => dist_sq < g.dist_sq,
            None => true,
        };
        if closer {
            self.tracked = Some(Ghost {
                bounds: other,
                dist_sq,
            });
        }
    }

    /// Promote the candidate tracked last tick to the ghost and start a new
    /// tracking round.
    pub(crate) fn refresh_ghost(&mut self) {
        self.ghost = self.tracked.take();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
