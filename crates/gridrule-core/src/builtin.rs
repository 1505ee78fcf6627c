//! The built-in rule pack.
//!
//! Installed by [`RuleRegistry::with_builtins`](crate::registry::RuleRegistry::with_builtins).
//! Definition order fixes bit order, and bit order fixes execution order when
//! several rules are combined, so rules that must run first are defined first
//! (gravity before the jump in `control_y`, control before friction).
//!
//! # Collision rules
//!
//! | name | effect |
//! |------|--------|
//! | `block_{top,right,bottom,left}` | clamp position to the contact edge |
//! | `stop_*` | zero the velocity component on the contact axis |
//! | `reverse_*` | negate that velocity component |
//! | `bounce_*` | set that component to the speed cap, away from the contact |
//! | `destroy` | mark dead (all sides) |
//! | `harm` | health -= [`HARM_AMOUNT`] (all sides) |
//! | `flag1`..`flag4` | set a generic flag (all sides) |
//! | `can_jump` | allow the next `control_y` jump (top only) |
//!
//! Shorthands: `block`, `stop`, `reverse`, `bounce`, `solid`.
//!
//! # Movement rules
//!
//! `gravity`, `control_x`, `control_y`, `friction_x`, `friction_y`,
//! `march_x`, `march_y`, `patrol_x`, `patrol_y`, `follow_x`, `follow_y`.
//!
//! Shorthands: `control`, `friction`, `march`, `patrol`, `follow`,
//! `platformer`, `topdown`.

use std::sync::Arc;

use crate::context::{CollisionFn, Contact, Motion, MovementFn};
use crate::geom::{Axis, Side};
use crate::registry::{BehaviorCode, RuleRegistrar};
use crate::RuleError;

/// Health removed by one `harm` contact.
pub const HARM_AMOUNT: f64 = 1.0;

fn hit(f: fn(&mut Contact<'_>)) -> BehaviorCode<CollisionFn> {
    BehaviorCode::Native(Arc::new(f))
}

fn step(f: fn(&mut Motion<'_>)) -> BehaviorCode<MovementFn> {
    BehaviorCode::Native(Arc::new(f))
}

// ---------------------------------------------------------------------------
// Collision behaviors
// ---------------------------------------------------------------------------

fn block(c: &mut Contact<'_>) {
    let e = &mut *c.entity;
    match c.side {
        Side::Top => e.y = c.other.y - e.h,
        Side::Bottom => e.y = c.other.y + c.other.h,
        Side::Left => e.x = c.other.x - e.w,
        Side::Right => e.x = c.other.x + c.other.w,
    }
}

fn stop(c: &mut Contact<'_>) {
    let axis = c.axis();
    *c.entity.vel_mut(axis) = 0.0;
}

fn reverse(c: &mut Contact<'_>) {
    let axis = c.axis();
    let v = c.entity.vel_mut(axis);
    *v = -*v;
}

fn bounce(c: &mut Contact<'_>) {
    let axis = c.axis();
    let speed = c.entity.max_speed(axis);
    // Near-side contacts push back toward low coordinates.
    *c.entity.vel_mut(axis) = if c.side == Side::near(axis) { -speed } else { speed };
}

fn destroy(c: &mut Contact<'_>) {
    c.entity.dead = true;
}

fn harm(c: &mut Contact<'_>) {
    c.entity.health -= HARM_AMOUNT;
}

fn can_jump(c: &mut Contact<'_>) {
    c.entity.can_jump = true;
}

// ---------------------------------------------------------------------------
// Movement behaviors
// ---------------------------------------------------------------------------

fn gravity(m: &mut Motion<'_>) {
    let e = &mut *m.entity;
    if e.gravity > 0.0 {
        e.vy = (e.vy + e.gravity).min(e.max_vy);
    } else if e.gravity < 0.0 {
        e.vy = (e.vy + e.gravity).max(-e.max_vy);
    }
}

fn control(m: &mut Motion<'_>) {
    let axis = m.axis;
    let e = &mut *m.entity;
    let (neg, pos) = match axis {
        Axis::X => (m.controls.left(), m.controls.right()),
        Axis::Y => (m.controls.up(), m.controls.down()),
    };

    if axis == Axis::Y && e.gravity != 0.0 {
        // Side-view: up jumps against gravity when grounded.
        if neg && e.can_jump {
            e.vy = -e.jump * e.gravity.signum();
        }
        e.can_jump = false;
        return;
    }

    let accel = e.accel(axis);
    let cap = e.max_speed(axis);
    let v = e.vel_mut(axis);
    if neg {
        *v -= accel;
    }
    if pos {
        *v += accel;
    }
    *v = (*v).clamp(-cap, cap);
}

fn friction(m: &mut Motion<'_>) {
    let f = m.entity.friction;
    *m.entity.vel_mut(m.axis) *= f;
}

fn march(m: &mut Motion<'_>) {
    let cap = m.entity.max_speed(m.axis);
    let v = m.entity.vel_mut(m.axis);
    *v = if *v < 0.0 { -cap } else { cap };
}

fn patrol(m: &mut Motion<'_>) {
    march(m);
    let axis = m.axis;
    let e = &mut *m.entity;
    let cap = e.max_speed(axis);
    let offset = e.pos(axis) - e.origin(axis);
    if offset >= e.patrol {
        *e.vel_mut(axis) = -cap;
    } else if offset <= -e.patrol {
        *e.vel_mut(axis) = cap;
    }
}

fn follow(m: &mut Motion<'_>) {
    let axis = m.axis;
    let e = &mut *m.entity;
    let gap = match &e.ghost {
        Some(ghost) => ghost.bounds.center(axis) - e.bounds().center(axis),
        None => 0.0,
    };
    let cap = e.max_speed(axis);
    let accel = e.accel(axis);
    // Aim for the remaining gap (capped), so the entity slows on approach.
    let desired = gap.clamp(-cap, cap);
    let v = e.vel_mut(axis);
    *v += (desired - *v).clamp(-accel, accel);
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

/// Install the built-in collision and movement rules.
pub fn install(r: &mut RuleRegistrar<'_>) -> Result<(), RuleError> {
    // -- collision ------------------------------------------------------------

    const SIDED: [(&str, fn(&mut Contact<'_>)); 4] = [
        ("block", block),
        ("stop", stop),
        ("reverse", reverse),
        ("bounce", bounce),
    ];
    const SIDES: [(Side, &str); 4] = [
        (Side::Top, "top"),
        (Side::Right, "right"),
        (Side::Bottom, "bottom"),
        (Side::Left, "left"),
    ];

    for (base, f) in SIDED {
        let mut names = Vec::with_capacity(4);
        for (side, suffix) in SIDES {
            let name = format!("{base}_{suffix}");
            r.define_collision(&name, hit(f), None)?;
            r.edit_side(side, &[name.as_str()]);
            names.push(name);
        }
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        r.collision_shorthand(base, &refs)?;
    }

    r.define_collision("destroy", hit(destroy), None)?;
    r.define_collision("harm", hit(harm), None)?;
    for n in 0..4 {
        let name = format!("flag{}", n + 1);
        let set: CollisionFn = Arc::new(move |c: &mut Contact<'_>| c.entity.flags[n] = true);
        r.define_collision(&name, BehaviorCode::Native(set), None)?;
        for side in Side::ALL {
            r.edit_side(side, &[name.as_str()]);
        }
    }
    for side in Side::ALL {
        r.edit_side(side, &["destroy", "harm"]);
    }
    r.define_collision("can_jump", hit(can_jump), None)?;
    r.edit_side(Side::Top, &["can_jump"]);

    r.collision_shorthand("solid", &["block", "stop"])?;

    // -- movement -------------------------------------------------------------

    r.define_movement("gravity", step(gravity), None)?;
    r.edit_axis(Axis::Y, &["gravity"]);

    const AXED: [(&str, fn(&mut Motion<'_>)); 5] = [
        ("control", control),
        ("friction", friction),
        ("march", march),
        ("patrol", patrol),
        ("follow", follow),
    ];
    for (base, f) in AXED {
        let x = format!("{base}_x");
        let y = format!("{base}_y");
        r.define_movement(&x, step(f), None)?;
        r.define_movement(&y, step(f), None)?;
        r.edit_axis(Axis::X, &[x.as_str()]);
        r.edit_axis(Axis::Y, &[y.as_str()]);
        r.movement_shorthand(base, &[x.as_str(), y.as_str()])?;
    }

    r.movement_shorthand("platformer", &["control_x", "friction_x", "gravity", "control_y"])?;
    r.movement_shorthand("topdown", &["control", "friction"])?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
