//! End-to-end dispatch tests: registry → rulebook → compiled sheets →
//! integrator, against a real level grid and entity pool.

use std::sync::Arc;

use gridrule_core::prelude::*;

fn column(rows: &[char]) -> Level {
    Level::from_rows(rows.iter().map(|c| vec![CellKey::from(*c)]).collect()).unwrap()
}

fn spawn(book: &Rulebook, pool: &mut EntityPool, key: char, x: f64, y: f64) -> usize {
    let key = CellKey::from(key);
    let id = book.require(&key).unwrap();
    pool.recycle(key, id, x, y, book.sheet(id).template())
}

fn update(book: &Rulebook, pool: &mut EntityPool, index: usize, level: Option<&Level>) -> bool {
    let sheet = book.sheet(pool.get(index).unwrap().sheet);
    let frame = Frame {
        level,
        controls: &ControlState::IDLE,
    };
    integrate::update(pool, index, sheet, &frame)
}

/// A Y-only no-op movement rule, so the sheet integrates velocity.
fn drift() -> MoveRule {
    let noop: MovementFn = Arc::new(|_: &mut Motion<'_>| {});
    MoveRule::Axes {
        x: None,
        y: Some(MoveAction::Inline(noop)),
    }
}

#[test]
fn shorthand_movement_runs_both_fragments() {
    let mut registry = RuleRegistry::new();
    let mut r = registry.registrar();
    let a: MovementFn = Arc::new(|m: &mut Motion<'_>| m.entity.x += 1.0);
    let b: MovementFn = Arc::new(|m: &mut Motion<'_>| m.entity.x += 2.0);
    assert_eq!(r.define_movement("A", BehaviorCode::Native(a), Some(1 << 0)).unwrap(), 1);
    assert_eq!(r.define_movement("B", BehaviorCode::Native(b), Some(1 << 1)).unwrap(), 2);
    let ab = r.movement_shorthand("AB", &["A", "B"]).unwrap();
    assert_eq!(ab, 0b11);

    let mut book = Rulebook::new(registry, false);
    book.define('m', Template::default()).unwrap();
    book.movement(
        'm',
        MoveRule::Axes {
            x: Some(MoveAction::Bits(ab)),
            y: None,
        },
    )
    .unwrap();
    book.compile_all();

    let mut pool = EntityPool::new();
    let i = spawn(&book, &mut pool, 'm', 0.0, 0.0);
    assert!(!update(&book, &mut pool, i, None));
    assert_eq!(pool.get(i).unwrap().x, 3.0);
}

#[test]
fn block_top_clamps_above_tile() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    book.define('@', Template { vy: 0.4, ..Default::default() }).unwrap();
    let block_top = book.registry().collision_bits(&["block_top"]);
    book.on_hit('@', '#', HitRule::Bits(block_top)).unwrap();
    book.movement('@', drift()).unwrap();
    book.compile_all();

    let level = column(&['.', '.', '.', '.', '.', '.', '#']);
    let mut pool = EntityPool::new();
    let i = spawn(&book, &mut pool, '@', 0.0, 5.0);
    assert!(!update(&book, &mut pool, i, Some(&level)));
    let e = pool.get(i).unwrap();
    assert_eq!(e.y, 5.0);
    // block does not stop; velocity survives.
    assert_eq!(e.vy, 0.4);
}

#[test]
fn destroy_kills_and_skips_x_phase() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    book.define('@', Template { vx: 0.3, vy: 0.4, ..Default::default() }).unwrap();
    let destroy = book.registry().collision_bits(&["destroy"]);
    book.on_hit('@', '#', HitRule::Bits(destroy)).unwrap();
    let x_noop: MovementFn = Arc::new(|_: &mut Motion<'_>| {});
    book.movement('@', drift()).unwrap();
    book.movement(
        '@',
        MoveRule::Axes {
            x: Some(MoveAction::Inline(x_noop)),
            y: None,
        },
    )
    .unwrap();
    book.compile_all();

    let level = column(&['.', '.', '.', '.', '.', '.', '#']);
    let mut pool = EntityPool::new();
    let i = spawn(&book, &mut pool, '@', 0.0, 5.0);
    assert!(update(&book, &mut pool, i, Some(&level)));
    let e = pool.get(i).unwrap();
    assert!(e.dead);
    assert_eq!(e.x, 0.0, "x phase must not run after a Y-phase death");
}

#[test]
fn unrelated_neighbor_type_is_a_noop() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    for key in ['A', 'B', 'C'] {
        book.define(key, Template::default()).unwrap();
    }
    let harm = book.registry().collision_bits(&["harm"]);
    book.on_hit('A', 'C', HitRule::Bits(harm)).unwrap();
    book.compile_all();

    let mut pool = EntityPool::new();
    let a = spawn(&book, &mut pool, 'A', 0.0, 0.0);
    let b = spawn(&book, &mut pool, 'B', 0.5, 0.0);
    let before = pool.slots().to_vec();

    let a_sheet = book.sheet(pool.get(a).unwrap().sheet);
    assert!(a_sheet.compiled().entities(Axis::X).contains_key(&CellKey::from('C')));
    assert!(!a_sheet.compiled().entities(Axis::X).contains_key(&CellKey::from('B')));

    assert!(!update(&book, &mut pool, a, None));
    assert!(!update(&book, &mut pool, b, None));
    assert_eq!(pool.slots(), &before[..]);
}

#[test]
fn recompiling_a_clean_book_changes_nothing() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    book.define('@', Template { gravity: 0.1, ..Default::default() }).unwrap();
    let platformer = book.registry().movement_bits(&["platformer"]);
    book.movement('@', MoveRule::Bits(platformer)).unwrap();
    assert_eq!(book.compile_all(), 1);
    let revision = book.sheets()[0].compiled().revision();
    assert_eq!(book.compile_all(), 0);
    assert_eq!(book.sheets()[0].compiled().revision(), revision);

    let mut pool = EntityPool::new();
    let i = spawn(&book, &mut pool, '@', 0.0, 0.0);
    update(&book, &mut pool, i, None);
    assert_eq!(pool.get(i).unwrap().y, 0.1);
}

#[test]
fn pair_rule_lets_both_sides_react() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    book.define('@', Template::default()).unwrap();
    book.define('e', Template::default()).unwrap();
    let harm = book.registry().collision_bits(&["harm"]);
    let flag = book.registry().collision_bits(&["flag2"]);
    book.on_hit(
        '@',
        'e',
        HitRule::pair(Some(HitRule::Bits(harm)), Some(HitRule::Bits(flag))),
    )
    .unwrap();
    book.compile_all();

    let mut pool = EntityPool::new();
    let player = spawn(&book, &mut pool, '@', 0.0, 0.0);
    let enemy = spawn(&book, &mut pool, 'e', 0.5, 0.5);
    assert!(update(&book, &mut pool, player, None));
    assert!(!update(&book, &mut pool, enemy, None));
    // The player died during its own update, so the enemy saw no live
    // neighbor.
    assert!(!pool.get(enemy).unwrap().flags[1]);

    let mut pool = EntityPool::new();
    let enemy = spawn(&book, &mut pool, 'e', 0.5, 0.5);
    let player = spawn(&book, &mut pool, '@', 0.0, 0.0);
    assert!(!update(&book, &mut pool, enemy, None));
    assert!(pool.get(enemy).unwrap().flags[1]);
    assert!(update(&book, &mut pool, player, None));
}

#[test]
fn follower_chases_ghost_one_tick_late() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    book.define('p', Template::default()).unwrap();
    book.define(
        'f',
        Template {
            accel_x: 1.0,
            max_vx: 1.0,
            ..Default::default()
        },
    )
    .unwrap();
    let follow_x = book.registry().movement_bits(&["follow_x"]);
    book.movement('f', MoveRule::Bits(follow_x)).unwrap();
    book.follow('f', 'p').unwrap();
    book.compile_all();

    let mut pool = EntityPool::new();
    spawn(&book, &mut pool, 'p', 10.0, 0.0);
    let f = spawn(&book, &mut pool, 'f', 0.0, 0.0);

    // First tick: no ghost yet, so no motion; the target is tracked.
    update(&book, &mut pool, f, None);
    assert_eq!(pool.get(f).unwrap().x, 0.0);
    // Second tick: the ghost from last tick pulls it right.
    update(&book, &mut pool, f, None);
    let e = pool.get(f).unwrap();
    assert_eq!(e.ghost.map(|g| g.bounds.x), Some(10.0));
    assert_eq!(e.x, 1.0);
}

fn row(cells: &str) -> Level {
    Level::from_rows(vec![cells.chars().map(CellKey::from).collect()]).unwrap()
}

/// A marcher `'o'` moving at its speed cap of 0.25 cells per tick.
fn marcher(book: &mut Rulebook, vx: f64) {
    book.define('o', Template { vx, ..Default::default() }).unwrap();
    let march = book.registry().movement_bits(&["march_x"]);
    book.movement('o', MoveRule::Bits(march)).unwrap();
}

#[test]
fn marching_into_wall_from_the_left_blocks_and_stops() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    marcher(&mut book, 0.0);
    let solid = book.registry().collision_bits(&["solid"]);
    book.on_hit('o', '#', HitRule::Bits(solid)).unwrap();
    book.compile_all();

    let level = row("...#");
    let mut pool = EntityPool::new();
    let i = spawn(&book, &mut pool, 'o', 0.0, 0.0);

    // x: 0.25, 0.5, ... 2.0 touches the wall, 2.25 overlaps it.
    for _ in 0..9 {
        assert!(!update(&book, &mut pool, i, Some(&level)));
    }
    let e = pool.get(i).unwrap();
    assert_eq!(e.x, 3.0 - e.w);
    assert_eq!(e.vx, 0.0);
    assert_eq!(e.y, 0.0);

    // Pressing on keeps it pinned.
    for _ in 0..5 {
        update(&book, &mut pool, i, Some(&level));
    }
    let e = pool.get(i).unwrap();
    assert_eq!((e.x, e.vx), (2.0, 0.0));
}

#[test]
fn marching_into_wall_from_the_right_fires_right_side() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    marcher(&mut book, -0.25);
    let c = book.registry().collision();
    let mut sides = SideRules::default();
    sides.set(
        Side::Right,
        Some(HitAction::Bits(c.bits(&["block_right", "reverse_right"]))),
    );
    sides.set(Side::Left, Some(HitAction::Bits(c.bits(&["flag1"]))));
    book.on_hit('o', '#', HitRule::Sides(sides)).unwrap();
    book.compile_all();

    let level = row("#...");
    let mut pool = EntityPool::new();
    let i = spawn(&book, &mut pool, 'o', 3.0, 0.0);

    // x: 2.75, 2.5, ... 1.0 touches the wall, 0.75 overlaps it.
    for _ in 0..8 {
        update(&book, &mut pool, i, Some(&level));
    }
    assert_eq!(pool.get(i).unwrap().x, 1.0);
    assert_eq!(pool.get(i).unwrap().vx, -0.25);

    update(&book, &mut pool, i, Some(&level));
    let e = pool.get(i).unwrap();
    assert_eq!(e.x, 1.0, "clamped to the wall's right edge");
    assert_eq!(e.vx, 0.25, "reversed away from the wall");
    assert!(!e.flags[0], "left-side reaction must not fire");
}

#[test]
fn marching_into_static_entity_blocks_on_x() {
    let mut book = Rulebook::new(RuleRegistry::with_builtins(), false);
    book.define('w', Template::default()).unwrap();
    marcher(&mut book, 0.0);
    let solid = book.registry().collision_bits(&["solid"]);
    book.on_hit('o', 'w', HitRule::Bits(solid)).unwrap();
    book.compile_all();

    let mut pool = EntityPool::new();
    let wall = spawn(&book, &mut pool, 'w', 3.0, 0.0);
    let i = spawn(&book, &mut pool, 'o', 0.0, 0.0);

    for _ in 0..12 {
        assert!(!update(&book, &mut pool, i, None));
    }
    let e = pool.get(i).unwrap();
    assert_eq!((e.x, e.vx), (2.0, 0.0));
    assert_eq!(pool.get(wall).unwrap().x, 3.0);
}
