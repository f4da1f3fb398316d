//! Perceptual colormaps.

use crate::{RenderError, RenderResult};

/// Viridis sampled at 0.0, 0.1, ..., 1.0.
const VIRIDIS: [[u8; 3]; 11] = [
    [68, 1, 84],
    [72, 36, 117],
    [65, 68, 135],
    [53, 95, 141],
    [42, 120, 142],
    [33, 145, 140],
    [34, 168, 132],
    [68, 191, 112],
    [122, 209, 81],
    [189, 223, 38],
    [253, 231, 37],
];

/// A colormap defined by evenly spaced anchors, linearly interpolated.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    anchors: Vec<[u8; 3]>,
}

impl Colormap {
    /// Look up a colormap by name. A `_r` suffix reverses it.
    pub fn by_name(name: &str) -> RenderResult<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let mut anchors = match base {
            "viridis" => VIRIDIS.to_vec(),
            "greys" => vec![[255, 255, 255], [0, 0, 0]],
            _ => {
                return Err(RenderError::InvalidStyle(format!(
                    "unknown colormap '{}'",
                    name
                )))
            }
        };
        if reversed {
            anchors.reverse();
        }
        Ok(Self { anchors })
    }

    /// Color at `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f32) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = (self.anchors.len() - 1) as f32;
        let pos = t * segments;
        let lo = (pos.floor() as usize).min(self.anchors.len() - 2);
        let frac = pos - lo as f32;

        let a = self.anchors[lo];
        let b = self.anchors[lo + 1];
        let mix = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * frac).round() as u8;
        [mix(0), mix(1), mix(2)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis_ends() {
        let cmap = Colormap::by_name("viridis").unwrap();
        assert_eq!(cmap.sample(0.0), [68, 1, 84]);
        assert_eq!(cmap.sample(1.0), [253, 231, 37]);
        assert_eq!(cmap.sample(0.5), [33, 145, 140]);
    }

    #[test]
    fn test_reversed() {
        let cmap = Colormap::by_name("viridis_r").unwrap();
        assert_eq!(cmap.sample(0.0), [253, 231, 37]);
        assert_eq!(cmap.sample(1.0), [68, 1, 84]);
    }

    #[test]
    fn test_interpolation_and_clamping() {
        let cmap = Colormap::by_name("greys").unwrap();
        assert_eq!(cmap.sample(0.5), [128, 128, 128]);
        assert_eq!(cmap.sample(-3.0), [255, 255, 255]);
        assert_eq!(cmap.sample(7.0), [0, 0, 0]);
    }

    #[test]
    fn test_unknown_name() {
        assert!(Colormap::by_name("jet").is_err());
    }
}
