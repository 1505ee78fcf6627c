//! Gridrule Engine -- game loop, level loading and camera on top of
//! [`gridrule_core`].
//!
//! A [`Game`](game::Game) owns the rulebook, the entity pool and the current
//! level. Each tick it compiles dirty rulesheets, moves the camera, and
//! updates every live entity in pool order, handing tiles and surviving
//! entities to a [`DisplaySink`](display::DisplaySink). The engine never
//! renders on its own.
//!
//! # Quick Start
//!
//! ```
//! use gridrule_engine::prelude::*;
//!
//! let mut game = Game::new(GameConfig::default()).unwrap();
//! let book = game.rulebook_mut();
//! book.define('@', Template { gravity: 0.1, ..Default::default() }).unwrap();
//! let solid = book.registry().collision_bits(&["solid", "can_jump"]);
//! book.on_hit('@', '#', HitRule::Bits(solid)).unwrap();
//! let platformer = book.registry().movement_bits(&["platformer"]);
//! book.movement('@', MoveRule::Bits(platformer)).unwrap();
//!
//! game.load_level(&LevelSource::lines("@.\n..\n##")).unwrap();
//! game.camera_mut().follow(Some(0));
//! game.run_ticks(30, &ControlState::IDLE, &mut NullSink);
//!
//! let player = game.pool().get(0).unwrap();
//! assert_eq!(player.y, 1.0);
//! assert_eq!(game.tick_count(), 30);
//! ```

#![deny(unsafe_code)]

pub mod camera;
pub mod config;
pub mod display;
pub mod game;
pub mod loader;
pub mod snapshot;

use gridrule_core::{LevelError, RuleError};

use loader::LoaderError;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Everything that can go wrong while setting up a game.
///
/// Ticking itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("invalid level: {0}")]
    Level(#[from] LevelError),

    #[error("cannot load level: {0}")]
    Loader(#[from] LoaderError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use gridrule_core;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the core prelude.
    pub use gridrule_core::prelude::*;

    pub use crate::camera::{Camera, CameraBounds, CameraConfig, ScreenRect, Smoothing};
    pub use crate::config::GameConfig;
    pub use crate::display::{DisplaySink, DrawCommand, DrawList, NullSink};
    pub use crate::game::{Game, TickReport};
    pub use crate::loader::{LevelFormat, LevelSource, LoaderError};
    pub use crate::EngineError;
}
