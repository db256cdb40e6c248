//! Globe geometry shared by placement and hit-testing
//!
//! Scene space is Y-up. A point at (lat, lng) on a sphere of radius r sits at
//! `phi = 90° - lat` from the +Y axis and `theta = 90° - lng` around it, so
//! lng 0 faces +Z and lng 90° faces +X.

use std::ops::{Add, Mul, Sub};

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            self
        }
    }

    /// Rotate about the vertical (Y) axis, right-handed
    pub fn rotate_y(self, angle: f64) -> Vec3 {
        let (sin, cos) = angle.sin_cos();
        Vec3::new(
            self.x * cos + self.z * sin,
            self.y,
            -self.x * sin + self.z * cos,
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Degrees lat/lng on a sphere of `radius` to scene space
pub fn polar_to_cartesian(lat: f64, lng: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat).to_radians();
    let theta = (90.0 - lng).to_radians();
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Inverse of `polar_to_cartesian`. Radius is taken from the point itself so
/// hits on raised bars still resolve. Returns (lat, lng) in degrees.
pub fn cartesian_to_polar(p: Vec3) -> Option<(f64, f64)> {
    let r = p.length();
    if r <= 0.0 || !r.is_finite() {
        return None;
    }
    let lat = (p.y / r).clamp(-1.0, 1.0).asin().to_degrees();
    let theta = p.z.atan2(p.x).to_degrees();
    Some((lat, normalize_lng(90.0 - theta)))
}

/// Wrap a longitude into [-180, 180]
pub fn normalize_lng(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Undo the globe's spin: rotate a world-space hit into globe-local space
pub fn to_globe_local(world: Vec3, globe_rotation_y: f64) -> Vec3 {
    world.rotate_y(-globe_rotation_y)
}

/// A pick ray in scene space
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Nearest intersection with a sphere centered at the origin
    pub fn intersect_sphere(&self, radius: f64) -> Option<Vec3> {
        let dir = self.direction.normalized();
        if dir.length() == 0.0 {
            return None;
        }
        let b = self.origin.dot(dir);
        let c = self.origin.dot(self.origin) - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt = disc.sqrt();
        let t = if -b - sqrt >= 0.0 { -b - sqrt } else { -b + sqrt };
        if t < 0.0 {
            return None;
        }
        Some(self.origin + dir * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn projection_axes() {
        let p = polar_to_cartesian(0.0, 0.0, 100.0);
        assert!(close(p.x, 0.0) && close(p.y, 0.0) && close(p.z, 100.0));
        let p = polar_to_cartesian(90.0, 0.0, 100.0);
        assert!(close(p.y, 100.0));
        let p = polar_to_cartesian(0.0, 90.0, 100.0);
        assert!(close(p.x, 100.0) && close(p.z, 0.0));
    }

    #[test]
    fn projection_round_trips() {
        for &(lat, lng) in &[(51.5, -0.12), (-33.86, 151.2), (0.0, 179.0), (80.0, -179.5), (-45.0, 0.0)] {
            let (la, ln) = cartesian_to_polar(polar_to_cartesian(lat, lng, 100.0)).unwrap();
            assert!(close(la, lat), "{} vs {}", la, lat);
            assert!(close(ln, lng), "{} vs {}", ln, lng);
        }
    }

    #[test]
    fn rotation_compensation_recovers_location() {
        let local = polar_to_cartesian(35.6762, 139.6503, 100.0);
        let spin = 1.234;
        let world = local.rotate_y(spin);
        let (lat, lng) = cartesian_to_polar(to_globe_local(world, spin)).unwrap();
        assert!(close(lat, 35.6762) && close(lng, 139.6503));
    }

    #[test]
    fn rotating_shifts_longitude() {
        let p = polar_to_cartesian(0.0, 0.0, 100.0).rotate_y(std::f64::consts::FRAC_PI_2);
        let (_, lng) = cartesian_to_polar(p).unwrap();
        assert!(close(lng, 90.0));
    }

    #[test]
    fn lng_wrapping() {
        assert_eq!(normalize_lng(190.0), -170.0);
        assert_eq!(normalize_lng(-190.0), 170.0);
        assert_eq!(normalize_lng(180.0), 180.0);
        assert_eq!(normalize_lng(-180.0), -180.0);
    }

    #[test]
    fn ray_hits_front_of_sphere() {
        let ray = Ray { origin: Vec3::new(0.0, 0.0, 300.0), direction: Vec3::new(0.0, 0.0, -1.0) };
        let hit = ray.intersect_sphere(100.0).unwrap();
        assert!(close(hit.z, 100.0));

        let miss = Ray { origin: Vec3::new(0.0, 150.0, 300.0), direction: Vec3::new(0.0, 0.0, -1.0) };
        assert!(miss.intersect_sphere(100.0).is_none());

        let away = Ray { origin: Vec3::new(0.0, 0.0, 300.0), direction: Vec3::new(0.0, 0.0, 1.0) };
        assert!(away.intersect_sphere(100.0).is_none());
    }

    #[test]
    fn degenerate_point() {
        assert!(cartesian_to_polar(Vec3::default()).is_none());
    }
}
