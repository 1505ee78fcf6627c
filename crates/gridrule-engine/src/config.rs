//! Game configuration.
//!
//! [`GameConfig`] is plain serde data so hosts can keep it next to their
//! level files:
//!
//! ```
//! use gridrule_engine::config::GameConfig;
//!
//! let config = GameConfig::from_json(r#"{ "strict": true, "camera": { "scale": 8.0 } }"#).unwrap();
//! assert!(config.strict);
//! assert!(config.pause_on_blur);
//! assert_eq!(config.camera.scale, 8.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::camera::{CameraConfig, Smoothing};
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Reject rulesheets defined after compilation has begun.
    pub strict: bool,
    /// Skip ticks while the host window is unfocused.
    pub pause_on_blur: bool,
    /// Seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    pub camera: CameraConfig,
}

impl Default for GameConfig {
    /// 60 Hz, lenient registration, paused on blur.
    fn default() -> Self {
        Self {
            strict: false,
            pause_on_blur: true,
            fixed_dt: 1.0 / 60.0,
            camera: CameraConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        fn positive(field: &'static str, value: f64) -> Result<(), EngineError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(EngineError::InvalidConfig {
                    field,
                    reason: format!("must be positive and finite, got {value}"),
                })
            }
        }

        positive("fixed_dt", self.fixed_dt)?;
        positive("camera.view_width", self.camera.view_width)?;
        positive("camera.view_height", self.camera.view_height)?;
        positive("camera.scale", self.camera.scale)?;
        match self.camera.smoothing {
            Smoothing::None => {}
            Smoothing::Linear { step } => positive("camera.smoothing.step", step)?,
            Smoothing::Lerp { factor } => {
                if !(factor > 0.0 && factor <= 1.0) {
                    return Err(EngineError::InvalidConfig {
                        field: "camera.smoothing.factor",
                        reason: format!("must be in (0, 1], got {factor}"),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.strict);
        assert!(config.pause_on_blur);
        assert_eq!(config.fixed_dt, 1.0 / 60.0);
    }

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(GameConfig::from_json("{}").unwrap(), GameConfig::default());
    }

    #[test]
    fn rejects_bad_fixed_dt() {
        let err = GameConfig::from_json(r#"{ "fixed_dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { field: "fixed_dt", .. }));
        let err = GameConfig::from_json(r#"{ "fixed_dt": -1.0 }"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }

    #[test]
    fn parses_smoothing_variants() {
        let config = GameConfig::from_json(
            r#"{ "camera": { "smoothing": { "kind": "lerp", "factor": 0.25 }, "bounds": "free" } }"#,
        )
        .unwrap();
        assert_eq!(config.camera.smoothing, Smoothing::Lerp { factor: 0.25 });
        let err = GameConfig::from_json(r#"{ "camera": { "smoothing": { "kind": "lerp", "factor": 2.0 } } }"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { field: "camera.smoothing.factor", .. }));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(GameConfig::from_json("{"), Err(EngineError::Json(_))));
    }
}
