//! Seeded procedural terrain
//!
//! A fixed LCG scatters `floor(w*h/100)` hills (and some depressions) over the
//! map. Each cell's elevation is the rounded sum of the cones covering it.
//! Identical arguments always produce an identical map.

use crate::core::types::GridPos;
use crate::spatial::grid::Grid;

/// Cells with elevation strictly below this hold water
pub const WATER_LEVEL: i32 = -1;

const HILL_MIN_RADIUS: u32 = 3;
const HILL_RADIUS_SPAN: u32 = 5; // radius in 3..=7
const HILL_MIN_HEIGHT: u32 = 1;
const HILL_HEIGHT_SPAN: u32 = 3; // height in 1..=3
const DEPRESSION_CHANCE: f64 = 0.4;

/// 32-bit linear congruential generator (Numerical Recipes constants)
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: i64) -> Self {
        Self { state: seed as u32 }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state
    }

    /// Uniform value in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    /// Uniform integer in [0, n)
    pub fn below(&mut self, n: u32) -> u32 {
        (self.next_f64() * n as f64).floor() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hill {
    pub center: GridPos,
    pub radius: u32,
    /// Signed peak height; negative values carve a depression
    pub height: i32,
}

impl Hill {
    fn contribution(&self, pos: GridPos) -> f64 {
        let dx = (pos.x - self.center.x) as f64;
        let dy = (pos.y - self.center.y) as f64;
        let distance = (dx * dx + dy * dy).sqrt();
        let radius = self.radius as f64;
        if distance < radius {
            self.height as f64 * (1.0 - distance / radius)
        } else {
            0.0
        }
    }
}

/// Draw hills in a fixed order: x, y, radius, height, sign
pub fn hills(width: i32, height: i32, seed: i64) -> Vec<Hill> {
    let mut lcg = Lcg::new(seed);
    let count = (width.max(0) * height.max(0) / 100) as usize;
    (0..count)
        .map(|_| {
            let x = lcg.below(width as u32) as i32;
            let y = lcg.below(height as u32) as i32;
            let radius = HILL_MIN_RADIUS + lcg.below(HILL_RADIUS_SPAN);
            let magnitude = (HILL_MIN_HEIGHT + lcg.below(HILL_HEIGHT_SPAN)) as i32;
            let sign = if lcg.next_f64() < DEPRESSION_CHANCE { -1 } else { 1 };
            Hill {
                center: GridPos::new(x, y),
                radius,
                height: sign * magnitude,
            }
        })
        .collect()
}

pub fn elevation_map(width: i32, height: i32, seed: i64) -> Grid<i32> {
    let hills = hills(width, height, seed);
    Grid::from_fn(width, height, |pos| {
        let sum: f64 = hills.iter().map(|h| h.contribution(pos)).sum();
        sum.round() as i32
    })
}
