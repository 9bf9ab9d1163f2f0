use crate::colormap::Colormap;
use simulation_common::{Metadata, RenderConfig, Result, SimError};

pub use simulation_common::{MAX_MARK, MIN_MARK};

/// Points per inch; marker sizes are areas in points^2.
const POINTS_PER_INCH: f64 = 72.0;

/// Appearance shared by every frame of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: f64,
    /// Marker size for `min_mass`.
    pub min_mark: f64,
    /// Marker size for `max_mass`.
    pub max_mark: f64,
    pub alpha: f64,
    pub colormap: Colormap,
    /// Frames are written as `<file_prefix><timestep>.png`.
    pub file_prefix: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle::from_config(&RenderConfig::default())
    }
}

impl RenderStyle {
    pub fn from_config(config: &RenderConfig) -> Self {
        let style = &config.style;
        RenderStyle {
            width_px: style.width_px,
            height_px: style.height_px,
            dpi: style.dpi,
            min_mark: style.min_marker,
            max_mark: style.max_marker,
            alpha: style.alpha,
            colormap: Colormap::from(style.colormap),
            file_prefix: config.output.file_prefix.clone(),
        }
    }

    pub fn frame_file_name(&self, timestep: u64) -> String {
        format!("{}{}.png", self.file_prefix, timestep)
    }
}

/// Maps masses from the simulation-wide range onto marker sizes and colormap positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerScale {
    min_mass: f64,
    max_mass: f64,
    min_mark: f64,
    max_mark: f64,
}

impl MarkerScale {
    /// Fails with a validation error unless `max_mass > min_mass`.
    pub fn new(min_mass: f64, max_mass: f64, min_mark: f64, max_mark: f64) -> Result<Self> {
        if max_mass.is_nan() || min_mass.is_nan() || max_mass <= min_mass {
            return Err(SimError::Validation(format!(
                "cannot normalize marker sizes: max_mass ({}) must be greater than min_mass ({})",
                max_mass, min_mass
            )));
        }
        Ok(MarkerScale { min_mass, max_mass, min_mark, max_mark })
    }

    pub fn for_metadata(metadata: &Metadata, style: &RenderStyle) -> Result<Self> {
        Self::new(
            metadata.min_mass as f64,
            metadata.max_mass as f64,
            style.min_mark,
            style.max_mark,
        )
    }

    /// `(mass - min) / (max - min) * (max_mark - min_mark) + min_mark`.
    ///
    /// Not clamped: masses outside the declared range extrapolate.
    pub fn size(&self, mass: f64) -> f64 {
        (mass - self.min_mass) / (self.max_mass - self.min_mass) * (self.max_mark - self.min_mark)
            + self.min_mark
    }

    /// Position of `mass` on the colormap, clamped to `[0, 1]`.
    pub fn color_position(&self, mass: f64) -> f64 {
        ((mass - self.min_mass) / (self.max_mass - self.min_mass)).clamp(0.0, 1.0)
    }

    pub fn mass_range(&self) -> (f64, f64) {
        (self.min_mass, self.max_mass)
    }
}

/// Converts a marker size (area in points^2) to a circle radius in pixels.
pub fn marker_radius_px(size: f64, dpi: f64) -> u32 {
    let radius = size.max(0.0).sqrt() / 2.0 * dpi / POINTS_PER_INCH;
    radius.round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scale() -> MarkerScale {
        MarkerScale::new(1.0, 10.0, MIN_MARK, MAX_MARK).unwrap()
    }

    #[test]
    fn range_endpoints_map_exactly() {
        assert_eq!(scale().size(1.0), MIN_MARK);
        assert_eq!(scale().size(10.0), MAX_MARK);
    }

    #[test]
    fn interior_mass_maps_affinely() {
        let expected = (5.0 - 1.0) / (10.0 - 1.0) * (150.0 - 30.0) + 30.0;
        assert!((scale().size(5.0) - expected).abs() < 1e-12);
        assert!((scale().size(5.0) - 83.333_333_333).abs() < 1e-6);
    }

    #[test]
    fn degenerate_mass_range_is_rejected() {
        let err = MarkerScale::new(3.0, 3.0, MIN_MARK, MAX_MARK).unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
        assert!(MarkerScale::new(5.0, 2.0, MIN_MARK, MAX_MARK).is_err());
    }

    #[test]
    fn color_position_clamps_outliers() {
        assert_eq!(scale().color_position(-4.0), 0.0);
        assert_eq!(scale().color_position(25.0), 1.0);
    }

    #[test]
    fn radius_grows_with_size() {
        assert_eq!(marker_radius_px(MIN_MARK, 100.0), 4);
        assert_eq!(marker_radius_px(MAX_MARK, 100.0), 9);
        assert_eq!(marker_radius_px(0.0, 100.0), 1);
    }

    #[test]
    fn frame_names_use_prefix() {
        assert_eq!(RenderStyle::default().frame_file_name(12), "timestep_12.png");
    }

    proptest! {
        #[test]
        fn sizes_stay_within_marker_bounds(
            min_mass in -1_000i64..1_000,
            span in 1i64..1_000,
            t in 0.0f64..=1.0,
        ) {
            let max_mass = min_mass + span;
            let scale = MarkerScale::new(min_mass as f64, max_mass as f64, MIN_MARK, MAX_MARK).unwrap();
            let mass = min_mass as f64 + t * span as f64;
            let size = scale.size(mass);
            prop_assert!(size >= MIN_MARK - 1e-9 && size <= MAX_MARK + 1e-9, "size {} for mass {}", size, mass);
        }
    }
}
