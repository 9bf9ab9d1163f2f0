use palette::{LinSrgb, Mix, Srgb};
use simulation_common::ColormapKind;

// Evenly spaced anchors sampled from the matplotlib maps of the same name.
const VIRIDIS: &[[u8; 3]] = &[
    [68, 1, 84],
    [71, 45, 123],
    [59, 82, 139],
    [44, 114, 142],
    [33, 145, 140],
    [40, 174, 128],
    [94, 201, 98],
    [173, 220, 48],
    [253, 231, 37],
];

const PLASMA: &[[u8; 3]] = &[
    [13, 8, 135],
    [65, 4, 157],
    [106, 0, 168],
    [143, 13, 164],
    [177, 42, 144],
    [204, 71, 120],
    [225, 100, 98],
    [242, 132, 75],
    [240, 249, 33],
];

const GREYS: &[[u8; 3]] = &[[255, 255, 255], [0, 0, 0]];

/// Continuous colormap interpolated in linear RGB between fixed anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colormap {
    anchors: &'static [[u8; 3]],
}

impl From<ColormapKind> for Colormap {
    fn from(kind: ColormapKind) -> Self {
        let anchors = match kind {
            ColormapKind::Viridis => VIRIDIS,
            ColormapKind::Plasma => PLASMA,
            ColormapKind::Greys => GREYS,
        };
        Colormap { anchors }
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Colormap::from(ColormapKind::default())
    }
}

impl Colormap {
    /// Color at position `t`; values outside `[0, 1]` are clamped.
    pub fn color(&self, t: f64) -> Srgb<u8> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = self.anchors.len() - 1;
        let scaled = t * segments as f64;
        let lower = (scaled.floor() as usize).min(segments - 1);
        let factor = (scaled - lower as f64) as f32;

        let a = anchor_linear(self.anchors[lower]);
        let b = anchor_linear(self.anchors[lower + 1]);
        let mixed: LinSrgb<f32> = a.mix(b, factor);
        Srgb::<f32>::from_linear(mixed).into_format()
    }
}

fn anchor_linear([r, g, b]: [u8; 3]) -> LinSrgb<f32> {
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(c: Srgb<u8>, rgb: [u8; 3]) -> bool {
        [c.red, c.green, c.blue]
            .iter()
            .zip(rgb.iter())
            .all(|(&got, &want)| (got as i16 - want as i16).abs() <= 1)
    }

    #[test]
    fn endpoints_match_anchors() {
        let viridis = Colormap::default();
        assert!(close(viridis.color(0.0), [68, 1, 84]));
        assert!(close(viridis.color(1.0), [253, 231, 37]));
        assert!(close(viridis.color(0.5), [33, 145, 140]));
    }

    #[test]
    fn out_of_range_positions_clamp() {
        let plasma = Colormap::from(ColormapKind::Plasma);
        assert_eq!(plasma.color(-3.0), plasma.color(0.0));
        assert_eq!(plasma.color(7.0), plasma.color(1.0));
        assert_eq!(plasma.color(f64::NAN), plasma.color(0.0));
    }

    #[test]
    fn greys_darken_monotonically() {
        let greys = Colormap::from(ColormapKind::Greys);
        let levels: Vec<u8> = (0..=10).map(|i| greys.color(i as f64 / 10.0).red).collect();
        assert!(levels.windows(2).all(|w| w[0] >= w[1]), "{levels:?}");
    }
}
