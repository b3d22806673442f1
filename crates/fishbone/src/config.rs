//! Configuration types for the fishbone engine.
//!
//! This module provides configuration structures that control the logical
//! drawing space and the starting appearance of new diagrams. All types
//! implement [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining canvas and appearance settings.
//! - [`CanvasConfig`] - Dimensions of the logical drawing space.
//! - [`AppearanceConfig`] - Optional overrides of the default [`Appearance`].
//!
//! # Example
//!
//! ```
//! # use fishbone::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.canvas().size().width(), 1200.0);
//! assert!(config.appearance().to_appearance().is_ok());
//! ```

use serde::Deserialize;

use fishbone_core::geometry::Size;

use crate::model::Appearance;

/// Top-level configuration combining canvas and appearance settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Logical canvas section.
    #[serde(default)]
    canvas: CanvasConfig,

    /// Appearance section.
    #[serde(default)]
    appearance: AppearanceConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified canvas and appearance configurations.
    pub fn new(canvas: CanvasConfig, appearance: AppearanceConfig) -> Self {
        Self { canvas, appearance }
    }

    /// Returns the canvas configuration.
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Returns the appearance configuration.
    pub fn appearance(&self) -> &AppearanceConfig {
        &self.appearance
    }
}

/// Dimensions of the logical drawing space.
///
/// All geometry is computed in this space and only mapped to rendered pixels
/// at the rendering boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    width: f32,

    #[serde(default = "default_height")]
    height: f32,
}

fn default_width() -> f32 {
    1200.0
}

fn default_height() -> f32 {
    720.0
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl CanvasConfig {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the logical canvas size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Checks that both dimensions are positive and finite.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending dimensions.
    pub fn validate(&self) -> Result<(), String> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(format!(
                "Canvas size must be positive, got {}x{}",
                self.width, self.height
            ))
        }
    }
}

/// Optional overrides of the default [`Appearance`].
///
/// Unset fields keep their defaults. Numeric values are clamped into their
/// valid bands when applied.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AppearanceConfig {
    #[serde(default)]
    bone_color: Option<String>,
    #[serde(default)]
    bone_thickness: Option<f32>,
    #[serde(default)]
    font_size: Option<f32>,
    #[serde(default)]
    arrow_width: Option<f32>,
    #[serde(default)]
    label_width: Option<f32>,
    #[serde(default)]
    rib_length: Option<f32>,
    #[serde(default)]
    block_width: Option<f32>,
    #[serde(default)]
    bone_slant: Option<f32>,
}

impl AppearanceConfig {
    /// Builds an [`Appearance`] from the defaults and the configured overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured bone color is not a valid CSS color.
    pub fn to_appearance(&self) -> Result<Appearance, String> {
        let mut appearance = Appearance::default();

        if let Some(color) = &self.bone_color {
            appearance
                .set_bone_color(color)
                .map_err(|err| format!("Invalid bone color in config: {err}"))?;
        }

        let setters: [(Option<f32>, fn(&mut Appearance, f32)); 7] = [
            (self.bone_thickness, Appearance::set_bone_thickness),
            (self.font_size, Appearance::set_font_size),
            (self.arrow_width, Appearance::set_arrow_width),
            (self.label_width, Appearance::set_label_width),
            (self.rib_length, Appearance::set_rib_length),
            (self.block_width, Appearance::set_block_width),
            (self.bone_slant, Appearance::set_bone_slant),
        ];
        for (value, set) in setters {
            if let Some(value) = value {
                set(&mut appearance, value);
            }
        }

        Ok(appearance)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_default_canvas() {
        let config = AppConfig::default();
        assert_eq!(config.canvas().size(), Size::new(1200.0, 720.0));
        assert!(config.canvas().validate().is_ok());
    }

    #[test]
    fn test_canvas_validate_rejects_zero() {
        assert!(CanvasConfig::new(0.0, 720.0).validate().is_err());
        assert!(CanvasConfig::new(1200.0, f32::NAN).validate().is_err());
    }

    #[test]
    fn test_appearance_overrides_are_clamped() {
        let config = AppearanceConfig {
            bone_slant: Some(5.0),
            font_size: Some(18.0),
            ..AppearanceConfig::default()
        };
        let appearance = config.to_appearance().unwrap();

        assert_approx_eq!(f32, appearance.bone_slant(), 20.0);
        assert_approx_eq!(f32, appearance.font_size(), 18.0);
        assert_approx_eq!(f32, appearance.rib_length(), 36.0);
    }

    #[test]
    fn test_appearance_invalid_color() {
        let config = AppearanceConfig {
            bone_color: Some("definitely-not-a-color".to_string()),
            ..AppearanceConfig::default()
        };
        let err = config.to_appearance().unwrap_err();
        assert!(err.contains("Invalid bone color"));
    }
}
