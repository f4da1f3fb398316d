//! Boundary detail levels.
//!
//! Vector boundary data is usually far more detailed than a regional map at
//! print resolution can show. Each [`BoundaryResolution`] maps to a
//! Douglas-Peucker tolerance in degrees, from `crude` (coarse outlines) to
//! `full` (every vertex kept).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryResolution {
    Crude,
    Low,
    Intermediate,
    #[default]
    High,
    Full,
}

impl BoundaryResolution {
    /// Maximum deviation in degrees allowed when simplifying a line.
    pub fn tolerance(&self) -> f64 {
        match self {
            BoundaryResolution::Crude => 0.25,
            BoundaryResolution::Low => 0.05,
            BoundaryResolution::Intermediate => 0.01,
            BoundaryResolution::High => 0.002,
            BoundaryResolution::Full => 0.0,
        }
    }

    /// Simplify a line to this detail level.
    pub fn simplify(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        simplify_line(points, self.tolerance())
    }
}

impl fmt::Display for BoundaryResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundaryResolution::Crude => "crude",
            BoundaryResolution::Low => "low",
            BoundaryResolution::Intermediate => "intermediate",
            BoundaryResolution::High => "high",
            BoundaryResolution::Full => "full",
        };
        f.write_str(name)
    }
}

impl FromStr for BoundaryResolution {
    type Err = String;

    /// Accepts full names and the single-letter codes `c`, `l`, `i`, `h`, `f`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "crude" => Ok(BoundaryResolution::Crude),
            "l" | "low" => Ok(BoundaryResolution::Low),
            "i" | "intermediate" => Ok(BoundaryResolution::Intermediate),
            "h" | "high" => Ok(BoundaryResolution::High),
            "f" | "full" => Ok(BoundaryResolution::Full),
            other => Err(format!("unknown boundary resolution '{}'", other)),
        }
    }
}

/// Douglas-Peucker simplification. The first and last points are always
/// kept, so closed rings stay closed.
pub fn simplify_line(points: &[(f64, f64)], tolerance: f64) -> Vec<(f64, f64)> {
    if points.len() < 3 || tolerance <= 0.0 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in start + 1..end {
            let dist = segment_distance(points[i], points[start], points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_idx = i;
            }
        }

        if max_dist > tolerance {
            keep[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
