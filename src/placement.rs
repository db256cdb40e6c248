//! Synthetic positions for hidden nodes
//!
//! Hidden peers have no trustworthy location, so they are drawn as a point
//! cloud that never touches the globe surface: either two clouds hovering
//! over the poles or a loose shell around the whole planet.

use crate::colors::HiddenTint;
use crate::config::{PlacementConfig, PlacementStrategy};
use crate::globe::{polar_to_cartesian, Vec3};
use crate::record::NodeRecord;
use rand::seq::SliceRandom;
use rand::Rng;
use std::f64::consts::{PI, TAU};

#[derive(Clone, Debug, PartialEq)]
pub struct HiddenPlacement {
    pub address: String,
    pub position: Vec3,
    pub tint: HiddenTint,
}

pub struct HiddenPlacer {
    config: PlacementConfig,
    globe_radius: f64,
}

impl HiddenPlacer {
    pub fn new(config: PlacementConfig, globe_radius: f64) -> Self {
        Self { config, globe_radius }
    }

    /// One placement per hidden node, in input order
    pub fn place<R: Rng + ?Sized>(&self, nodes: &[NodeRecord], rng: &mut R) -> Vec<HiddenPlacement> {
        nodes
            .iter()
            .map(|node| {
                let position = match self.config.strategy {
                    PlacementStrategy::Polar => self.polar_position(rng),
                    PlacementStrategy::Shell => self.shell_position(rng),
                };
                let tint = *HiddenTint::ALL.choose(rng).unwrap_or(&HiddenTint::Cyan);
                HiddenPlacement {
                    address: node.address.clone(),
                    position,
                    tint,
                }
            })
            .collect()
    }

    fn polar_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let pole_lat = if rng.gen_bool(0.5) {
            self.config.pole_lat_deg
        } else {
            -self.config.pole_lat_deg
        };
        let pole_lng = rng.gen_range(-180.0..180.0);
        let anchor = polar_to_cartesian(pole_lat, pole_lng, self.globe_radius);

        let axis = anchor.normalized();
        let (u, v) = orthonormal_basis(axis);
        let spin = rng.gen_range(0.0..TAU);
        let tilt = rng.gen_range(0.0..=self.config.cone_half_angle.max(0.0));
        let (lo, hi) = ordered(self.config.offset_min, self.config.offset_max);
        let len = rng.gen_range(lo..=hi);

        let dir = axis * tilt.cos() + (u * spin.cos() + v * spin.sin()) * tilt.sin();
        anchor + dir * len
    }

    fn shell_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        // Uniform over the sphere: cos(phi) uniform in [-1, 1]
        let theta = rng.gen_range(0.0..TAU);
        let phi = rng.gen_range(-1.0f64..=1.0).acos();
        let (lo, hi) = ordered(self.config.shell_base_radius, self.config.shell_max_radius);
        let r = rng.gen_range(lo..=hi);
        Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.cos(),
            r * phi.sin() * theta.sin(),
        )
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Two unit vectors perpendicular to `axis` and to each other
fn orthonormal_basis(axis: Vec3) -> (Vec3, Vec3) {
    let helper = if axis.x.abs() < 0.9 { Vec3::new(1.0, 0.0, 0.0) } else { Vec3::new(0.0, 0.0, 1.0) };
    let u = axis.cross(helper).normalized();
    let v = axis.cross(u).normalized();
    (u, v)
}

/// Angle between two directions, radians
pub fn angle_between(a: Vec3, b: Vec3) -> f64 {
    let denom = a.length() * b.length();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().min(PI)
}
