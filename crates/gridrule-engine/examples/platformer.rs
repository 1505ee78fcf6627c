//! Headless platformer demo -- a scripted player runs, jumps onto a ledge and
//! dodges a patrolling enemy. Frames are drawn as ASCII.
//!
//! Run with:
//!   cargo run --example platformer -p gridrule-engine
//!
//! Set `RUST_LOG=gridrule_core=debug` to watch rulesheets compile.

use gridrule_engine::prelude::*;

const LEVEL: &str = "\
....................
....................
..........####......
....................
.@..............e...
####################";

// ---------------------------------------------------------------------------
// ASCII sink
// ---------------------------------------------------------------------------

/// Draws one character per cell. Entities overwrite the tile beneath their
/// top-left corner.
struct AsciiSink {
    width: usize,
    height: usize,
    scale: f64,
    cells: Vec<char>,
}

impl AsciiSink {
    fn new(width: usize, height: usize, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            cells: vec![' '; width * height],
        }
    }

    fn put(&mut self, rect: ScreenRect, c: char) {
        let x = (rect.x / self.scale).round();
        let y = (rect.y / self.scale).round();
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = c;
        }
    }

    fn frame(&self) -> String {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn glyph(key: &CellKey) -> char {
    match key {
        CellKey::Sym(s) => s.chars().next().unwrap_or('?'),
        CellKey::Num(n) => char::from_digit((*n % 10) as u32, 10).unwrap_or('?'),
    }
}

impl DisplaySink for AsciiSink {
    fn tile(&mut self, key: &CellKey, _cx: usize, _cy: usize, rect: ScreenRect) {
        // Entity cells render as floor; the entity itself is drawn on top.
        let c = match glyph(key) {
            '#' => '#',
            _ => '.',
        };
        self.put(rect, c);
    }

    fn entity(&mut self, _index: usize, entity: &Component, rect: ScreenRect) {
        self.put(rect, glyph(&entity.key));
    }
}

// ---------------------------------------------------------------------------
// Input script
// ---------------------------------------------------------------------------

fn script(tick: u64) -> ControlState {
    let mut input = ControlState::IDLE;
    match tick {
        0..=39 => input.right = true,
        40..=44 => {
            input.right = true;
            input.up = true;
        }
        45..=90 => input.right = true,
        _ => {}
    }
    input
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = GameConfig::from_json(r#"{ "camera": { "view_width": 20, "view_height": 6, "scale": 1 } }"#)?;
    let mut game = Game::new(config)?;

    let book = game.rulebook_mut();
    book.define(
        '@',
        Template {
            gravity: 0.05,
            jump: 0.6,
            max_vx: 0.2,
            ..Default::default()
        },
    )?;
    book.define('e', Template { vx: -0.1, max_vx: 0.1, patrol: 2.0, ..Default::default() })?;

    let solid = book.registry().collision_bits(&["solid", "can_jump"]);
    let wall = book.registry().collision_bits(&["block", "reverse"]);
    let harm = book.registry().collision_bits(&["harm"]);
    let platformer = book.registry().movement_bits(&["platformer"]);
    let patrol = book.registry().movement_bits(&["patrol_x"]);

    book.on_hit('@', '#', HitRule::Bits(solid))?;
    book.movement('@', MoveRule::Bits(platformer))?;
    book.on_hit('e', '#', HitRule::Bits(wall))?;
    book.on_hit('e', '@', HitRule::pair(None, Some(HitRule::Bits(harm))))?;
    book.movement('e', MoveRule::Bits(patrol))?;

    let spawned = game.load_level(&LevelSource::lines(LEVEL))?;
    println!("spawned {spawned} entities");
    game.camera_mut().follow(Some(0));

    let (w, h) = (20, 6);
    for _ in 0..120 {
        let mut sink = AsciiSink::new(w, h, game.camera().config().scale);
        let input = script(game.tick_count());
        let report = game.tick(&input, &mut sink).clone();
        if report.tick % 20 == 0 || report.deaths > 0 {
            println!("tick {} ({} updated, {} died)", report.tick, report.updated, report.deaths);
            println!("{}\n", sink.frame());
        }
    }

    match game.pool().get(0) {
        Some(player) if !player.dead => println!("player survived at ({:.2}, {:.2})", player.x, player.y),
        _ => println!("player died"),
    }
    println!("state hash {}", game.state_hash());
    Ok(())
}
