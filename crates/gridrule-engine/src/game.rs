//! The game loop.
//!
//! A [`Game`] owns one rulebook, one entity pool, the current level, a
//! camera, and its configuration. Each running [`tick`](Game::tick):
//!
//! 1. compiles dirty rulesheets,
//! 2. moves the camera and draws the visible tiles,
//! 3. updates every live entity in pool order (movement, integration,
//!    collision) and draws it if it survived.
//!
//! Ticks are skipped entirely while the game is paused, or unfocused when
//! `pause_on_blur` is set. Skipped ticks do not advance the tick counter.
//!
//! # Example
//!
//! ```
//! use gridrule_engine::prelude::*;
//!
//! let mut game = Game::new(GameConfig::default()).unwrap();
//! let book = game.rulebook_mut();
//! book.define('o', Template { vx: 0.5, ..Default::default() }).unwrap();
//! let march = book.registry().movement_bits(&["march_x"]);
//! book.movement('o', MoveRule::Bits(march)).unwrap();
//!
//! game.load_level(&LevelSource::string("o...", 4)).unwrap();
//! game.run_ticks(2, &ControlState::IDLE, &mut NullSink);
//! assert_eq!(game.tick_count(), 2);
//! assert_eq!(game.pool().get(0).unwrap().x, 0.5);
//! ```

use std::time::{Duration, Instant};

use gridrule_core::controls::Controls;
use gridrule_core::geom::Aabb;
use gridrule_core::integrate::{self, Frame};
use gridrule_core::key::CellKey;
use gridrule_core::level::Level;
use gridrule_core::pool::EntityPool;
use gridrule_core::registry::RuleRegistry;
use gridrule_core::rulebook::Rulebook;

use crate::camera::Camera;
use crate::config::GameConfig;
use crate::display::DisplaySink;
use crate::loader::LevelSource;
use crate::EngineError;

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// What happened during the last call to [`Game::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick counter after the tick.
    pub tick: u64,
    /// Paused or unfocused; nothing ran.
    pub skipped: bool,
    /// Rulesheets compiled at the start of the tick.
    pub compiled: usize,
    /// Live entities updated.
    pub updated: usize,
    /// Entities that died this tick.
    pub deaths: usize,
    pub tiles_drawn: usize,
    pub entities_drawn: usize,
    /// Wall-clock time for the whole tick.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

pub struct Game {
    book: Rulebook,
    pool: EntityPool,
    level: Option<Level>,
    camera: Camera,
    config: GameConfig,
    paused: bool,
    focused: bool,
    tick_counter: u64,
    last_report: TickReport,
}

impl Game {
    /// A game with the built-in rule pack.
    pub fn new(config: GameConfig) -> Result<Self, EngineError> {
        Self::with_registry(config, RuleRegistry::with_builtins())
    }

    pub fn with_registry(config: GameConfig, registry: RuleRegistry) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            book: Rulebook::new(registry, config.strict),
            pool: EntityPool::new(),
            level: None,
            camera: Camera::new(config.camera.clone()),
            config,
            paused: false,
            focused: true,
            tick_counter: 0,
            last_report: TickReport::default(),
        })
    }

    // -- setup -----------------------------------------------------------------

    /// Spawn an entity of type `key` at `(x, y)`. Returns its pool index.
    pub fn spawn(&mut self, key: impl Into<CellKey>, x: f64, y: f64) -> Result<usize, EngineError> {
        let key = key.into();
        let id = self.book.require(&key)?;
        let template = self.book.sheet(id).template();
        Ok(self.pool.recycle(key, id, x, y, template))
    }

    /// Parse a level and install it with [`set_level`](Self::set_level).
    pub fn load_level(&mut self, source: &LevelSource) -> Result<usize, EngineError> {
        let level = source.parse()?;
        Ok(self.set_level(level))
    }

    /// Replace the level: kill every entity, then spawn one entity per cell
    /// whose key names a rulesheet. The cell keeps its value. Returns the
    /// number of entities spawned.
    pub fn set_level(&mut self, level: Level) -> usize {
        self.pool.destroy_all();
        let mut spawned = 0;
        for (cx, cy, key) in level.cells() {
            if let Some(id) = self.book.id(key) {
                let template = self.book.sheet(id).template();
                self.pool
                    .recycle_from_level(key.clone(), id, cx as f64, cy as f64, template);
                spawned += 1;
            }
        }
        tracing::debug!(
            width = level.width(),
            height = level.height(),
            spawned,
            "loaded level"
        );
        self.level = Some(level);
        spawned
    }

    /// Level-spawned entities return to their origin; all others are killed.
    pub fn reset(&mut self) {
        let book = &self.book;
        self.pool
            .reset_all_or_kill(|id| book.sheet(id).template());
    }

    /// Kill every entity. The level stays.
    pub fn clear(&mut self) {
        self.pool.destroy_all();
    }

    // -- run state ---------------------------------------------------------------

    pub fn pause(&mut self) {
        if !self.paused {
            tracing::info!(tick = self.tick_counter, "paused");
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            tracing::info!(tick = self.tick_counter, "resumed");
        }
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Report host window focus.
    pub fn set_focus(&mut self, focused: bool) {
        if self.focused != focused {
            tracing::info!(tick = self.tick_counter, focused, "focus changed");
        }
        self.focused = focused;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Whether the next tick will run.
    pub fn is_running(&self) -> bool {
        !self.paused && (self.focused || !self.config.pause_on_blur)
    }

    // -- ticking -----------------------------------------------------------------

    /// Run one tick (or skip it). See the module docs for the phases.
    pub fn tick(&mut self, controls: &dyn Controls, sink: &mut dyn DisplaySink) -> &TickReport {
        let start = Instant::now();
        if !self.is_running() {
            self.last_report = TickReport {
                tick: self.tick_counter,
                skipped: true,
                ..Default::default()
            };
            return &self.last_report;
        }

        let mut report = TickReport {
            compiled: self.book.compile_all(),
            ..Default::default()
        };

        self.camera.update(&self.pool, self.level.as_ref());
        if let Some(level) = &self.level {
            let (cols, rows) = self.camera.visible_cells(level);
            for cy in rows {
                for cx in cols.clone() {
                    if let Some(key) = level.get(cx, cy) {
                        let rect = self.camera.to_screen(Aabb::cell(cx, cy));
                        sink.tile(key, cx, cy, rect);
                        report.tiles_drawn += 1;
                    }
                }
            }
        }

        let frame = Frame {
            level: self.level.as_ref(),
            controls,
        };
        for index in 0..self.pool.len() {
            let Some(entity) = self.pool.get(index) else {
                break;
            };
            if entity.dead {
                continue;
            }
            let sheet = self.book.sheet(entity.sheet);
            report.updated += 1;
            if integrate::update(&mut self.pool, index, sheet, &frame) {
                report.deaths += 1;
                continue;
            }
            let entity = &self.pool.slots()[index];
            sink.entity(index, entity, self.camera.to_screen(entity.bounds()));
            report.entities_drawn += 1;
        }

        self.tick_counter += 1;
        report.tick = self.tick_counter;
        report.duration = start.elapsed();
        tracing::trace!(
            tick = report.tick,
            updated = report.updated,
            deaths = report.deaths,
            compiled = report.compiled,
            "tick"
        );
        self.last_report = report;
        &self.last_report
    }

    /// Call [`tick`](Self::tick) `count` times. Returns how many ticks
    /// actually ran.
    pub fn run_ticks(&mut self, count: u64, controls: &dyn Controls, sink: &mut dyn DisplaySink) -> u64 {
        let mut ran = 0;
        for _ in 0..count {
            if !self.tick(controls, sink).skipped {
                ran += 1;
            }
        }
        ran
    }

    // -- accessors ---------------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds, computed as `tick_count * fixed_dt` to avoid drift.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rulebook(&self) -> &Rulebook {
        &self.book
    }

    /// Setup access to rulesheets and the registry.
    pub fn rulebook_mut(&mut self) -> &mut Rulebook {
        &mut self.book
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut EntityPool {
        &mut self.pool
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut Level> {
        self.level.as_mut()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
