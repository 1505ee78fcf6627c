//! Display sinks.
//!
//! The engine never renders. Each running tick it hands every visible tile
//! and every surviving live entity to a [`DisplaySink`] together with its
//! screen rectangle; the sink decides what drawing means.

use gridrule_core::component::Component;
use gridrule_core::key::CellKey;

use crate::camera::ScreenRect;

/// Receiver of per-tick draw calls.
pub trait DisplaySink {
    /// One visible level cell.
    fn tile(&mut self, key: &CellKey, cx: usize, cy: usize, rect: ScreenRect);

    /// One live entity, after its update.
    fn entity(&mut self, index: usize, entity: &Component, rect: ScreenRect);
}

/// A sink that draws nothing (headless runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn tile(&mut self, _key: &CellKey, _cx: usize, _cy: usize, _rect: ScreenRect) {}

    fn entity(&mut self, _index: usize, _entity: &Component, _rect: ScreenRect) {}
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Tile {
        key: CellKey,
        cx: usize,
        cy: usize,
        rect: ScreenRect,
    },
    Entity {
        index: usize,
        key: CellKey,
        rect: ScreenRect,
    },
}

/// A sink that records draw calls, for tests and debugging overlays.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn tiles(&self) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Tile { .. }))
    }

    pub fn entities(&self) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Entity { .. }))
    }
}

impl DisplaySink for DrawList {
    fn tile(&mut self, key: &CellKey, cx: usize, cy: usize, rect: ScreenRect) {
        self.commands.push(DrawCommand::Tile {
            key: key.clone(),
            cx,
            cy,
            rect,
        });
    }

    fn entity(&mut self, index: usize, entity: &Component, rect: ScreenRect) {
        self.commands.push(DrawCommand::Entity {
            index,
            key: entity.key.clone(),
            rect,
        });
    }
}
