//! Hexagonal density binning over the lng/lat plane
//!
//! Pointy-top hexagons in odd-row offset layout, the same tiling d3-hexbin
//! produces: row `j` sits at `lat = j * 1.5r`, and odd rows are shifted half a
//! cell east. Every point lands in the cell whose center is nearest.

use crate::colors::{density_color, Rgb};
use crate::config::HexbinConfig;
use crate::globe::normalize_lng;
use crate::record::NodeRecord;
use std::collections::{HashMap, VecDeque};
use std::fmt;

// ============================================================================
// Cell id
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct CellId {
    pub i: i64,
    pub j: i64,
}

impl CellId {
    /// The six cells sharing an edge with this one
    pub fn neighbors(&self) -> [CellId; 6] {
        let (i, j) = (self.i, self.j);
        // Odd rows are shifted east, so their diagonal neighbors are too
        let shift = if j & 1 == 1 { 0 } else { -1 };
        [
            CellId { i: i - 1, j },
            CellId { i: i + 1, j },
            CellId { i: i + shift, j: j - 1 },
            CellId { i: i + shift + 1, j: j - 1 },
            CellId { i: i + shift, j: j + 1 },
            CellId { i: i + shift + 1, j: j + 1 },
        ]
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.i, self.j)
    }
}

// ============================================================================
// Bin
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Bin {
    pub id: CellId,
    pub lat: f64,                  // Cell center
    pub lng: f64,
    pub weight: usize,
    pub color: Rgb,
    pub altitude: f64,
    pub points: Vec<(f64, f64)>,   // Contributing (lng, lat) pairs
}

/// Adjacent non-empty cells fused into one footprint (rendering only)
#[derive(Clone, Debug)]
pub struct MergedRegion {
    pub cells: Vec<CellId>,
    pub weight: usize,
    pub lat: f64,                  // Weight-averaged center
    pub lng: f64,
}

/// One aggregation result. Holds nothing from earlier runs.
#[derive(Clone, Debug, Default)]
pub struct HexLayer {
    pub bins: Vec<Bin>,
    pub total: usize,
    pub max_value: f64,
}

impl HexLayer {
    pub fn total_weight(&self) -> usize {
        self.bins.iter().map(|b| b.weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn get(&self, id: CellId) -> Option<&Bin> {
        self.bins.iter().find(|b| b.id == id)
    }

    /// Bin position by cell id, for repeated lookups
    pub fn index(&self) -> HashMap<CellId, usize> {
        self.bins.iter().enumerate().map(|(k, b)| (b.id, k)).collect()
    }

    /// Connected components of adjacent cells, in order of first bin
    pub fn merged(&self) -> Vec<MergedRegion> {
        let index = self.index();
        let mut visited = vec![false; self.bins.len()];
        let mut regions = Vec::new();

        for start in 0..self.bins.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut queue = VecDeque::from([start]);
            let mut cells = Vec::new();
            let (mut weight, mut lat_sum, mut lng_sum) = (0usize, 0.0, 0.0);

            while let Some(k) = queue.pop_front() {
                let bin = &self.bins[k];
                cells.push(bin.id);
                weight += bin.weight;
                lat_sum += bin.lat * bin.weight as f64;
                lng_sum += bin.lng * bin.weight as f64;

                for n in bin.id.neighbors() {
                    if let Some(&nk) = index.get(&n) {
                        if !visited[nk] {
                            visited[nk] = true;
                            queue.push_back(nk);
                        }
                    }
                }
            }

            let w = weight.max(1) as f64;
            regions.push(MergedRegion {
                cells,
                weight,
                lat: lat_sum / w,
                lng: lng_sum / w,
            });
        }

        regions
    }
}

// ============================================================================
// Binner
// ============================================================================

/// JS-style rounding (halves go up) so cell ids match d3-hexbin
#[inline]
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

#[derive(Clone, Debug)]
pub struct HexBinner {
    config: HexbinConfig,
    dx: f64,
    dy: f64,
}

impl HexBinner {
    pub fn new(config: HexbinConfig) -> Self {
        let r = if config.radius_deg > 0.0 { config.radius_deg } else { HexbinConfig::default().radius_deg };
        Self {
            dx: r * 2.0 * (std::f64::consts::PI / 3.0).sin(),
            dy: r * 1.5,
            config,
        }
    }

    pub fn config(&self) -> &HexbinConfig {
        &self.config
    }

    /// Cell containing (lng, lat)
    pub fn cell_of(&self, lng: f64, lat: f64) -> CellId {
        let py = lat / self.dy;
        let mut pj = round_half_up(py);
        let px = lng / self.dx - ((pj as i64) & 1) as f64 / 2.0;
        let mut pi = round_half_up(px);
        let py1 = py - pj;

        if py1.abs() * 3.0 > 1.0 {
            let px1 = px - pi;
            let pi2 = pi + (if px < pi { -1.0 } else { 1.0 }) / 2.0;
            let pj2 = pj + (if py < pj { -1.0 } else { 1.0 });
            let px2 = px - pi2;
            let py2 = py - pj2;
            if px1 * px1 + py1 * py1 > px2 * px2 + py2 * py2 {
                pi = pi2 + (if (pj as i64) & 1 == 1 { 1.0 } else { -1.0 }) / 2.0;
                pj = pj2;
            }
        }

        CellId { i: pi as i64, j: pj as i64 }
    }

    /// Center of a cell as (lng, lat)
    pub fn center_of(&self, id: CellId) -> (f64, f64) {
        let lng = (id.i as f64 + (id.j & 1) as f64 / 2.0) * self.dx;
        let lat = id.j as f64 * self.dy;
        (lng, lat)
    }

    pub fn altitude(&self, weight: usize) -> f64 {
        (weight as f64 * self.config.altitude_multiplier).min(self.config.max_altitude)
    }

    /// Bin (lng, lat) points. Non-finite points are skipped.
    pub fn bin<I>(&self, points: I) -> HexLayer
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut order: Vec<CellId> = Vec::new();
        let mut cells: HashMap<CellId, Vec<(f64, f64)>> = HashMap::new();
        let mut total = 0usize;

        for (lng, lat) in points {
            if !lng.is_finite() || !lat.is_finite() {
                continue;
            }
            total += 1;
            let id = self.cell_of(lng, lat);
            cells
                .entry(id)
                .or_insert_with(|| {
                    order.push(id);
                    Vec::new()
                })
                .push((lng, lat));
        }

        let max_value = total as f64 / self.config.max_value_divisor;
        let bins = order
            .into_iter()
            .map(|id| {
                let points = cells.remove(&id).unwrap_or_default();
                let weight = points.len();
                let (lng, lat) = self.center_of(id);
                Bin {
                    id,
                    lat,
                    lng: normalize_lng(lng),     // Edge cells can center past ±180
                    weight,
                    color: density_color(weight as f64, max_value),
                    altitude: self.altitude(weight),
                    points,
                }
            })
            .collect();

        HexLayer { bins, total, max_value }
    }

    pub fn bin_nodes(&self, nodes: &[NodeRecord]) -> HexLayer {
        self.bin(nodes.iter().map(|n| (n.lng, n.lat)))
    }
}

impl Default for HexBinner {
    fn default() -> Self {
        Self::new(HexbinConfig::default())
    }
}
