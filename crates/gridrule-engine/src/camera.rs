//! A 2D view over the level, measured in cells.
//!
//! The [`Camera`] keeps the top-left corner of a `view_width` x
//! `view_height` window. Each tick it moves toward its target: the center
//! of a followed entity while that entity lives, otherwise the last known
//! shadow point. Movement toward the target is optionally smoothed, and the
//! window can be clamped to the level extents.
//!
//! World coordinates are cells; screen coordinates are `cells * scale`.

use std::ops::Range;

use gridrule_core::geom::Aabb;
use gridrule_core::level::Level;
use gridrule_core::pool::EntityPool;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// How the camera approaches its target each tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Smoothing {
    /// Snap to the target.
    #[default]
    None,
    /// Move at most `step` cells per axis per tick.
    Linear { step: f64 },
    /// Close `factor` of the remaining distance per tick.
    Lerp { factor: f64 },
}

/// Whether the view may leave the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraBounds {
    Free,
    /// Keep the view inside `[0, level size]` where the level is large enough.
    #[default]
    Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// View width in cells.
    pub view_width: f64,
    /// View height in cells.
    pub view_height: f64,
    /// Screen units per cell.
    pub scale: f64,
    pub smoothing: Smoothing,
    pub bounds: CameraBounds,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            view_width: 20.0,
            view_height: 15.0,
            scale: 16.0,
            smoothing: Smoothing::None,
            bounds: CameraBounds::Level,
        }
    }
}

// ---------------------------------------------------------------------------
// Screen rectangles
// ---------------------------------------------------------------------------

/// A rectangle in screen units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,
    /// Top-left corner of the view, in cells.
    x: f64,
    y: f64,
    /// Pool index of the followed entity.
    target: Option<usize>,
    /// Fallback focus point (a world-space center).
    shadow: (f64, f64),
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        let shadow = (config.view_width / 2.0, config.view_height / 2.0);
        Self {
            config,
            x: 0.0,
            y: 0.0,
            target: None,
            shadow,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Follow the entity at a pool index, or nothing.
    pub fn follow(&mut self, target: Option<usize>) {
        self.target = target;
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Move the fallback focus point.
    pub fn set_shadow(&mut self, x: f64, y: f64) {
        self.shadow = (x, y);
    }

    pub fn shadow(&self) -> (f64, f64) {
        self.shadow
    }

    /// Top-left corner of the view, in cells.
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Jump straight to a focus point, ignoring smoothing.
    pub fn center_on(&mut self, x: f64, y: f64, level: Option<&Level>) {
        self.x = x - self.config.view_width / 2.0;
        self.y = y - self.config.view_height / 2.0;
        self.clamp(level);
    }

    /// Advance one tick toward the current target.
    pub fn update(&mut self, pool: &EntityPool, level: Option<&Level>) {
        if let Some(e) = self.target.and_then(|i| pool.get(i)).filter(|e| !e.dead) {
            let b = e.bounds();
            self.shadow = (b.center_x(), b.center_y());
        }
        let goal_x = self.shadow.0 - self.config.view_width / 2.0;
        let goal_y = self.shadow.1 - self.config.view_height / 2.0;

        match self.config.smoothing {
            Smoothing::None => {
                self.x = goal_x;
                self.y = goal_y;
            }
            Smoothing::Linear { step } => {
                self.x += (goal_x - self.x).clamp(-step, step);
                self.y += (goal_y - self.y).clamp(-step, step);
            }
            Smoothing::Lerp { factor } => {
                self.x += (goal_x - self.x) * factor;
                self.y += (goal_y - self.y) * factor;
            }
        }
        self.clamp(level);
    }

    fn clamp(&mut self, level: Option<&Level>) {
        let Some(level) = level else { return };
        if self.config.bounds == CameraBounds::Free {
            return;
        }
        let max_x = (level.width() as f64 - self.config.view_width).max(0.0);
        let max_y = (level.height() as f64 - self.config.view_height).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
        self.y = self.y.clamp(0.0, max_y);
    }

    /// World bounds to screen rectangle.
    pub fn to_screen(&self, bounds: Aabb) -> ScreenRect {
        let s = self.config.scale;
        ScreenRect {
            x: (bounds.x - self.x) * s,
            y: (bounds.y - self.y) * s,
            w: bounds.w * s,
            h: bounds.h * s,
        }
    }

    /// Column and row ranges of level cells at least partly inside the view.
    pub fn visible_cells(&self, level: &Level) -> (Range<usize>, Range<usize>) {
        fn span(lo: f64, len: f64, limit: usize) -> Range<usize> {
            let start = (lo.floor().max(0.0) as usize).min(limit);
            let end = ((lo + len).ceil().max(0.0) as usize).min(limit);
            start..end.max(start)
        }
        (
            span(self.x, self.config.view_width, level.width()),
            span(self.y, self.config.view_height, level.height()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridrule_core::component::Template;
    use gridrule_core::key::CellKey;
    use gridrule_core::rulebook::Rulebook;
    use gridrule_core::registry::RuleRegistry;

    fn level(w: usize, h: usize) -> Level {
        Level::from_cells(w, h, vec![CellKey::from('.'); w * h]).unwrap()
    }

    fn config(smoothing: Smoothing, bounds: CameraBounds) -> CameraConfig {
        CameraConfig {
            view_width: 4.0,
            view_height: 2.0,
            scale: 10.0,
            smoothing,
            bounds,
        }
    }

    fn pool_with_entity_at(x: f64, y: f64) -> EntityPool {
        let mut book = Rulebook::new(RuleRegistry::new(), false);
        let id = book.define('@', Template::default()).unwrap();
        let mut pool = EntityPool::new();
        pool.recycle(CellKey::from('@'), id, x, y, &Template::default());
        pool
    }

    #[test]
    fn follows_entity_center() {
        let pool = pool_with_entity_at(9.5, 4.5);
        let mut cam = Camera::new(config(Smoothing::None, CameraBounds::Free));
        cam.follow(Some(0));
        cam.update(&pool, None);
        assert_eq!(cam.position(), (8.0, 4.0));
        assert_eq!(cam.shadow(), (10.0, 5.0));
    }

    #[test]
    fn falls_back_to_shadow_when_target_dies() {
        let mut pool = pool_with_entity_at(9.5, 4.5);
        let mut cam = Camera::new(config(Smoothing::None, CameraBounds::Free));
        cam.follow(Some(0));
        cam.update(&pool, None);
        pool.get_mut(0).unwrap().dead = true;
        pool.get_mut(0).unwrap().x = 100.0;
        cam.update(&pool, None);
        assert_eq!(cam.position(), (8.0, 4.0));
    }

    #[test]
    fn linear_and_lerp_smoothing() {
        let pool = EntityPool::new();
        let mut cam = Camera::new(config(Smoothing::Linear { step: 1.0 }, CameraBounds::Free));
        cam.set_shadow(12.0, 1.0);
        cam.update(&pool, None);
        assert_eq!(cam.position(), (1.0, 0.0));

        let mut cam = Camera::new(config(Smoothing::Lerp { factor: 0.5 }, CameraBounds::Free));
        cam.set_shadow(12.0, 1.0);
        cam.update(&pool, None);
        assert_eq!(cam.position(), (5.0, 0.0));
    }

    #[test]
    fn level_bounds_clamp_the_view() {
        let pool = EntityPool::new();
        let lvl = level(10, 5);
        let mut cam = Camera::new(config(Smoothing::None, CameraBounds::Level));
        cam.set_shadow(0.0, 0.0);
        cam.update(&pool, Some(&lvl));
        assert_eq!(cam.position(), (0.0, 0.0));
        cam.set_shadow(100.0, 100.0);
        cam.update(&pool, Some(&lvl));
        assert_eq!(cam.position(), (6.0, 3.0));
    }

    #[test]
    fn screen_transform_and_visible_cells() {
        let lvl = level(10, 5);
        let mut cam = Camera::new(config(Smoothing::None, CameraBounds::Free));
        cam.center_on(3.5, 2.0, None);
        assert_eq!(cam.position(), (1.5, 1.0));
        let rect = cam.to_screen(Aabb::new(2.0, 1.0, 1.0, 1.0));
        assert_eq!(rect, ScreenRect { x: 5.0, y: 0.0, w: 10.0, h: 10.0 });
        assert_eq!(cam.visible_cells(&lvl), (1..6, 1..3));
    }
}
