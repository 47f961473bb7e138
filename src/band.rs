use serde::{Deserialize, Serialize};

/// One equalizer band acting as an attractor.
///
/// Positions are unbounded. Levels are expected in `[0, 1]` but are sanitized
/// on read, and a field missing from the wire form reads as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Band {
    pub x: f32,
    pub y: f32,
    pub dry_level: f32,
    pub wet_level: f32,
}

/// Which band level drives a particle population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Pulled by `wet_level`.
    Primary,
    /// Pulled by `dry_level`; drawn as the secondary layer.
    Shadow,
}

impl Variant {
    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Shadow => "shadow",
        }
    }
}

impl Band {
    pub fn new(x: f32, y: f32, dry_level: f32, wet_level: f32) -> Self {
        Self {
            x,
            y,
            dry_level,
            wet_level,
        }
    }

    pub fn level(&self, variant: Variant) -> f32 {
        let raw = match variant {
            Variant::Primary => self.wet_level,
            Variant::Shadow => self.dry_level,
        };
        sanitize_level(raw)
    }

    pub fn has_finite_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Squared distance in f64; finite for any pair of finite f32 points.
    pub fn dist_sq(&self, x: f32, y: f32) -> f64 {
        let dx = f64::from(self.x) - f64::from(x);
        let dy = f64::from(self.y) - f64::from(y);
        dx * dx + dy * dy
    }
}

/// Band closest to `(x, y)` by squared distance.
///
/// Ties resolve to the earliest band in snapshot order. Bands with a
/// non-finite position never win.
pub fn nearest_band(bands: &[Band], x: f32, y: f32) -> Option<&Band> {
    let mut best: Option<(&Band, f64)> = None;
    for band in bands {
        let d2 = band.dist_sq(x, y);
        if !d2.is_finite() {
            continue;
        }
        match best {
            Some((_, best_d2)) if d2 >= best_d2 => {}
            _ => best = Some((band, d2)),
        }
    }
    best.map(|(band, _)| band)
}

fn sanitize_level(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}
