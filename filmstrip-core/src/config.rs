//! Controller configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunable constants of the position controller.
///
/// All pixel values are resolution-independent; hosts targeting a specific
/// display density scale `image_gap` and `horizontal_slack` before handing
/// the config over. The defaults match common photo-viewer tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerConfig {
    /// Fixed visual margin between two adjacent boxes, in pixels.
    pub image_gap: i32,
    /// Extra horizontal width added to the stable bound during snap-back,
    /// so a snap landing exactly on an edge does not immediately re-trigger.
    pub horizontal_slack: i32,
    /// Absolute ceiling for up-scaling an image, regardless of view size.
    pub scale_limit: f32,
    /// Multiplier applied below the minimal scale while a gesture is live.
    pub scale_min_extra: f32,
    /// Multiplier applied above the maximal scale while a gesture is live.
    pub scale_max_extra: f32,
    /// Fraction of the view width an image may fill in film mode, portrait.
    pub film_portrait_width: f32,
    /// Fraction of the view height an image may fill in film mode, portrait.
    pub film_portrait_height: f32,
    /// Fraction of the view width an image may fill in film mode, landscape.
    pub film_landscape_width: f32,
    /// Fraction of the view height an image may fill in film mode, landscape.
    pub film_landscape_height: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            image_gap: 16,
            horizontal_slack: 12,
            scale_limit: 4.0,
            scale_min_extra: 0.7,
            scale_max_extra: 1.4,
            film_portrait_width: 0.7,
            film_portrait_height: 0.48,
            film_landscape_width: 0.7,
            film_landscape_height: 0.7,
        }
    }
}

impl ControllerConfig {
    /// Check the config for values the kernel cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scale_limit < 1.0 || !self.scale_limit.is_finite() {
            return Err(ConfigError::ScaleLimit(self.scale_limit));
        }
        if !(self.scale_min_extra > 0.0 && self.scale_min_extra <= 1.0)
            || self.scale_max_extra < 1.0
        {
            return Err(ConfigError::ExtraRange {
                min: self.scale_min_extra,
                max: self.scale_max_extra,
            });
        }
        if self.image_gap < 0 || self.horizontal_slack < 0 {
            return Err(ConfigError::NegativeMargin {
                gap: self.image_gap,
                slack: self.horizontal_slack,
            });
        }
        for f in [
            self.film_portrait_width,
            self.film_portrait_height,
            self.film_landscape_width,
            self.film_landscape_height,
        ] {
            if !(f > 0.0 && f <= 1.0) {
                return Err(ConfigError::FilmEnvelope(f));
            }
        }
        Ok(())
    }
}

/// A configuration value the kernel cannot operate with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The scale ceiling would forbid showing images at their natural size.
    #[error("scale limit must be a finite value >= 1, got {0}")]
    ScaleLimit(f32),
    /// The temporary gesture overshoot range does not straddle 1.0.
    #[error("extra scaling range must straddle 1.0 (min {min}, max {max})")]
    ExtraRange {
        /// Configured below-minimum multiplier.
        min: f32,
        /// Configured above-maximum multiplier.
        max: f32,
    },
    /// Gap or slack margins must not be negative.
    #[error("gap and slack must be non-negative (gap {gap}, slack {slack})")]
    NegativeMargin {
        /// Configured inter-box gap.
        gap: i32,
        /// Configured horizontal slack.
        slack: i32,
    },
    /// A film-mode envelope fraction is outside `(0, 1]`.
    #[error("film envelope fractions must be within (0, 1], got {0}")]
    FilmEnvelope(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(ControllerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_degenerate_values() {
        let mut cfg = ControllerConfig {
            scale_limit: 0.5,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ScaleLimit(_))));

        cfg = ControllerConfig {
            scale_max_extra: 0.9,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ExtraRange { .. })));

        cfg = ControllerConfig {
            image_gap: -1,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NegativeMargin { .. })
        ));

        cfg = ControllerConfig {
            film_portrait_height: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::FilmEnvelope(_))));
    }
}
