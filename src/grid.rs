//! Per-tick spatial hash and connection search.
//!
//! The grid is rebuilt from scratch on every call and dropped afterwards.
//! Each particle only looks at the 3x3 block of cells around its own, so a
//! pair further apart than one cell edge along either axis is never
//! compared. Connection radii reach 160 units at full band level while the
//! default cell edge is 120, so long connections at high levels can be
//! missed. Those pairs are simply left unconnected.

use crate::band::{nearest_band, Band, Variant};
use crate::particle::Particle;
use std::collections::HashMap;

/// Floats per connection record: `x1, y1, x2, y2, opacity`.
pub const LINE_STRIDE: usize = 5;

const BASE_RADIUS: f32 = 10.0;
const LEVEL_RADIUS: f32 = 150.0;
const OPACITY_GAIN: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Unclamped; can exceed 1.0 at high band levels.
    pub opacity: f32,
}

/// Connection radius for a band level.
pub fn max_distance(level: f32) -> f32 {
    BASE_RADIUS + level * LEVEL_RADIUS
}

/// Decodes a flat line buffer. A trailing partial record is ignored.
pub fn iter_connections(buf: &[f32]) -> impl Iterator<Item = Connection> + '_ {
    buf.chunks_exact(LINE_STRIDE).map(|c| Connection {
        x1: c[0],
        y1: c[1],
        x2: c[2],
        y2: c[3],
        opacity: c[4],
    })
}

/// Particle indices bucketed by integer cell coordinate.
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<u64, Vec<usize>>,
}

impl SpatialGrid {
    pub fn build(particles: &[Particle], cell_size: f32) -> Self {
        let mut cells: HashMap<u64, Vec<usize>> = HashMap::with_capacity(particles.len());
        for (i, p) in particles.iter().enumerate() {
            let (cx, cy) = cell_coord(p.x, p.y, cell_size);
            cells.entry(pack_cell(cx, cy)).or_default().push(i);
        }
        Self { cell_size, cells }
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, cx: i32, cy: i32) -> &[usize] {
        self.cells
            .get(&pack_cell(cx, cy))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Indices in the 3x3 block of cells around `(x, y)`, cell by cell.
    pub fn neighborhood(&self, x: f32, y: f32) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = cell_coord(x, y, self.cell_size);
        (-1i32..=1).flat_map(move |oy| {
            (-1i32..=1).flat_map(move |ox| {
                self.cell(cx.wrapping_add(ox), cy.wrapping_add(oy))
                    .iter()
                    .copied()
            })
        })
    }
}

/// Every connection found through the 3x3 grid search.
///
/// Each qualifying pair is emitted twice, once from each end. Output order
/// follows grid traversal and carries no meaning.
pub fn connections(
    particles: &[Particle],
    variant: Variant,
    bands: &[Band],
    cell_size: f32,
) -> Vec<f32> {
    let mut out = Vec::new();
    if bands.is_empty() {
        return out;
    }

    let grid = SpatialGrid::build(particles, cell_size);
    for (i, p1) in particles.iter().enumerate() {
        for j in grid.neighborhood(p1.x, p1.y) {
            if j == i {
                continue;
            }
            push_if_connected(&mut out, p1, &particles[j], variant, bands);
        }
    }
    out
}

/// Same records as [`connections`] by inspecting every ordered pair.
///
/// Quadratic; meant for benchmarks and for checking the grid.
pub fn connections_exhaustive(particles: &[Particle], variant: Variant, bands: &[Band]) -> Vec<f32> {
    let mut out = Vec::new();
    if bands.is_empty() {
        return out;
    }

    for (i, p1) in particles.iter().enumerate() {
        for (j, p2) in particles.iter().enumerate() {
            if j == i {
                continue;
            }
            push_if_connected(&mut out, p1, p2, variant, bands);
        }
    }
    out
}

fn push_if_connected(out: &mut Vec<f32>, p1: &Particle, p2: &Particle, variant: Variant, bands: &[Band]) {
    let d = (p1.x - p2.x).hypot(p1.y - p2.y);

    let mx = (p1.x + p2.x) * 0.5;
    let my = (p1.y + p2.y) * 0.5;
    let Some(band) = nearest_band(bands, mx, my) else {
        return;
    };

    let level = band.level(variant);
    let max_dist = max_distance(level);
    if d < max_dist {
        let opacity = (1.0 - d / max_dist) * level * OPACITY_GAIN;
        out.extend_from_slice(&[p1.x, p1.y, p2.x, p2.y, opacity]);
    }
}

fn cell_coord(x: f32, y: f32, cell_size: f32) -> (i32, i32) {
    // `as` saturates, and maps NaN to 0.
    ((x / cell_size).floor() as i32, (y / cell_size).floor() as i32)
}

fn pack_cell(cx: i32, cy: i32) -> u64 {
    ((cx as u32 as u64) << 32) | cy as u32 as u64
}
