//! Collision scanners.
//!
//! [`scan_tiles`] walks the level cells under an entity's footprint and
//! [`scan_pool`] walks the whole entity pool. Both look each neighbor's key
//! up in a compiled [`DispatchTable`] and run the selected routine when the
//! bounds overlap strictly. Both stop as soon as the entity is dying.

use crate::component::Component;
use crate::compile::DispatchTable;
use crate::context::Contact;
use crate::geom::{Aabb, Axis};
use crate::key::CellKey;
use crate::level::Level;

/// Clip `[floor(lo), ceil(hi))` to `[0, limit)`.
fn cell_range(lo: f64, hi: f64, limit: usize) -> std::ops::Range<usize> {
    let start = lo.floor().max(0.0) as usize;
    let end = (hi.ceil().max(0.0) as usize).min(limit);
    start.min(end)..end
}

/// Dispatch `table` against every level cell the entity overlaps, row-major.
/// Returns the number of routines run.
pub fn scan_tiles(entity: &mut Component, table: &DispatchTable, axis: Axis, level: &Level) -> usize {
    if table.is_empty() {
        return 0;
    }
    let b = entity.bounds();
    let rows = cell_range(b.y, b.y + b.h, level.height());
    let cols = cell_range(b.x, b.x + b.w, level.width());

    let mut dispatched = 0;
    for cy in rows {
        for cx in cols.clone() {
            let Some(key) = level.get(cx, cy) else {
                tracing::warn!(cx, cy, "tile lookup outside level inside clipped range");
                continue;
            };
            let Some(branch) = table.get(key) else {
                continue;
            };
            let tile = Aabb::cell(cx, cy);
            // Earlier routines in this scan may have moved the entity.
            let mine = entity.bounds();
            if !mine.overlaps(&tile) {
                continue;
            }
            if let Some((side, routine)) = branch.select(axis, &mine, &tile) {
                routine.run(&mut Contact {
                    entity: &mut *entity,
                    key,
                    other: tile,
                    side,
                    neighbor: None,
                });
                dispatched += 1;
                if entity.is_dying() {
                    return dispatched;
                }
            }
        }
    }
    dispatched
}

/// Mutable references to two distinct slots.
fn pair_mut<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = slice.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = slice.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

/// Dispatch `table` against every live entity overlapping `slots[index]`,
/// walking the pool from the end toward the front.
///
/// When `follow` is set, every live entity of that type is also offered as
/// a follow candidate, overlapping or not. Returns the number of routines
/// run.
pub fn scan_pool(
    slots: &mut [Component],
    index: usize,
    table: &DispatchTable,
    axis: Axis,
    follow: Option<&CellKey>,
) -> usize {
    let mut dispatched = 0;
    for j in (0..slots.len()).rev() {
        if j == index {
            continue;
        }
        let (me, other) = pair_mut(slots, index, j);
        if other.dead {
            continue;
        }
        if follow == Some(&other.key) {
            me.track(other.bounds());
        }
        let Some((key, branch)) = table.get_key_value(&other.key) else {
            continue;
        };
        let mine = me.bounds();
        let theirs = other.bounds();
        if !mine.overlaps(&theirs) {
            continue;
        }
        if let Some((side, routine)) = branch.select(axis, &mine, &theirs) {
            routine.run(&mut Contact {
                entity: &mut *me,
                key,
                other: theirs,
                side,
                neighbor: Some(&mut *other),
            });
            dispatched += 1;
            if me.is_dying() {
                break;
            }
        }
    }
    dispatched
}
