//! Synthetic snapshot used when real data can't be loaded

use crate::record::{Network, NodeRecord};
use crate::sanitize::{round_coord, sanitize};
use rand::Rng;

pub struct DemoRegion {
    pub name: &'static str,
    pub country: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
}

pub const DEMO_REGIONS: [DemoRegion; 6] = [
    DemoRegion { name: "New York", country: "US", lat: 40.7128, lng: -74.0060, count: 150 },
    DemoRegion { name: "London", country: "GB", lat: 51.5074, lng: -0.1278, count: 200 },
    DemoRegion { name: "Tokyo", country: "JP", lat: 35.6762, lng: 139.6503, count: 100 },
    DemoRegion { name: "San Francisco", country: "US", lat: 37.7749, lng: -122.4194, count: 120 },
    DemoRegion { name: "Berlin", country: "DE", lat: 52.5200, lng: 13.4050, count: 90 },
    DemoRegion { name: "Sydney", country: "AU", lat: -33.8688, lng: 151.2093, count: 60 },
];

/// Spread (degrees, full width) of demo nodes around their region
const REGION_SPREAD: f64 = 10.0;

pub const DEMO_HIDDEN_MIN: usize = 100;
pub const DEMO_HIDDEN_MAX: usize = 200;

pub struct DemoData {
    pub clearnet: Vec<NodeRecord>,
    pub hidden: Vec<NodeRecord>,
}

impl DemoData {
    pub fn total(&self) -> usize {
        self.clearnet.len() + self.hidden.len()
    }
}

fn slug(name: &str) -> String {
    name.to_ascii_lowercase().replace(' ', "-")
}

pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> DemoData {
    let mut clearnet = Vec::with_capacity(DEMO_REGIONS.iter().map(|r| r.count).sum());

    for region in &DEMO_REGIONS {
        for i in 0..region.count {
            let lat = region.lat + rng.gen_range(-0.5f64..0.5) * REGION_SPREAD;
            let lng = region.lng + rng.gen_range(-0.5f64..0.5) * REGION_SPREAD;
            let ((lat, lng), source) = sanitize(Some(lat), Some(lng), Some(region.country), rng);
            let mut node = NodeRecord::new(
                format!("demo-{}-{}", slug(region.name), i),
                round_coord(lat),
                round_coord(lng),
                Network::Clearnet,
            )
            .with_place(region.country, region.name);
            node.coord_source = source;
            node.version = "1.0.0".to_string();
            clearnet.push(node);
        }
    }

    let hidden_count = rng.gen_range(DEMO_HIDDEN_MIN..=DEMO_HIDDEN_MAX);
    let hidden = (0..hidden_count)
        .map(|i| {
            let mut node = NodeRecord::new(format!("demo-{}.onion", i), 0.0, 0.0, Network::Hidden);
            node.version = "1.0.0".to_string();
            node
        })
        .collect();

    DemoData { clearnet, hidden }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn fixed_regional_counts() {
        let data = generate(&mut StdRng::seed_from_u64(1));
        assert_eq!(data.clearnet.len(), 720);
        for region in &DEMO_REGIONS {
            let n = data.clearnet.iter().filter(|n| n.city == region.name).count();
            assert_eq!(n, region.count);
        }
        assert!((DEMO_HIDDEN_MIN..=DEMO_HIDDEN_MAX).contains(&data.hidden.len()));
    }

    #[test]
    fn addresses_are_unique() {
        let data = generate(&mut StdRng::seed_from_u64(2));
        let all: HashSet<_> = data.clearnet.iter().chain(&data.hidden).map(|n| n.address.as_str()).collect();
        assert_eq!(all.len(), data.total());
        assert!(data.hidden.iter().all(|n| n.address.ends_with(".onion")));
    }

    #[test]
    fn demo_nodes_stay_near_their_region() {
        let data = generate(&mut StdRng::seed_from_u64(3));
        for node in &data.clearnet {
            let region = DEMO_REGIONS.iter().find(|r| r.name == node.city).unwrap();
            assert!((node.lat - region.lat).abs() <= 5.0 + 1e-4);
            assert!((node.lng - region.lng).abs() <= 5.0 + 1e-4);
        }
    }
}
