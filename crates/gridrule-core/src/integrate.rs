//! The per-entity update.
//!
//! One call to [`update`] advances one entity by one tick:
//!
//! 1. promote last tick's follow candidate to the ghost, run the tick hook,
//! 2. Y: movement routine, `y += vy`, tile scan, pool scan,
//! 3. if the entity is dying, mark it dead, run the destroy hook and stop,
//! 4. X: movement routine, `x += vx`, tile scan, pool scan,
//! 5. `health <= 0` marks the entity dead; a dead entity runs its destroy
//!    hook.
//!
//! Static rulesheets skip movement and integration and only run the two
//! collision phases, and only when they declare collision rules.

use crate::compile::CompiledSheet;
use crate::context::Motion;
use crate::controls::Controls;
use crate::geom::Axis;
use crate::level::Level;
use crate::pool::EntityPool;
use crate::rulesheet::Rulesheet;
use crate::scan;

/// Per-tick inputs shared by every entity update.
pub struct Frame<'a> {
    /// The tile grid, if a level is loaded.
    pub level: Option<&'a Level>,
    pub controls: &'a dyn Controls,
}

/// Advance the entity at `index` by one tick using `sheet`'s compiled
/// routines. Returns `true` when the entity died during this update.
///
/// Dead or missing slots are left alone.
pub fn update(pool: &mut EntityPool, index: usize, sheet: &Rulesheet, frame: &Frame<'_>) -> bool {
    let compiled = sheet.compiled();
    {
        let Some(entity) = pool.get_mut(index) else {
            return false;
        };
        if entity.dead {
            return false;
        }
        entity.refresh_ghost();
        if let Some(hook) = sheet.tick_hook() {
            hook(entity);
        }
    }

    if sheet.is_static() && !sheet.has_collision_rules() {
        return finish(pool, index, sheet);
    }

    for axis in Axis::ORDER {
        if !sheet.is_static() {
            step(pool, index, compiled, axis, frame);
        }
        collide(pool, index, compiled, axis, frame);
        if axis == Axis::Y && pool.slots()[index].is_dying() {
            return finish(pool, index, sheet);
        }
    }

    finish(pool, index, sheet)
}

/// Movement routine, then integrate position along `axis`.
fn step(pool: &mut EntityPool, index: usize, compiled: &CompiledSheet, axis: Axis, frame: &Frame<'_>) {
    let entity = &mut pool.slots_mut()[index];
    if let Some(routine) = compiled.movement(axis) {
        routine.run(&mut Motion {
            entity: &mut *entity,
            axis,
            controls: frame.controls,
        });
    }
    let v = entity.vel(axis);
    *entity.pos_mut(axis) += v;
}

fn collide(pool: &mut EntityPool, index: usize, compiled: &CompiledSheet, axis: Axis, frame: &Frame<'_>) {
    let slots = pool.slots_mut();
    if let Some(level) = frame.level {
        if compiled.scans_tiles(axis) {
            scan::scan_tiles(&mut slots[index], compiled.tiles(axis), axis, level);
            if slots[index].is_dying() {
                return;
            }
        }
    }
    if compiled.scans_pool(axis) {
        scan::scan_pool(slots, index, compiled.entities(axis), axis, compiled.follow());
    }
}

/// Settle death at the end of an update.
fn finish(pool: &mut EntityPool, index: usize, sheet: &Rulesheet) -> bool {
    let entity = &mut pool.slots_mut()[index];
    if entity.health <= 0.0 {
        entity.dead = true;
    }
    if !entity.dead {
        return false;
    }
    tracing::trace!(index, key = %entity.key, "entity died");
    if let Some(hook) = sheet.destroy_hook() {
        hook(entity);
    }
    true
}
