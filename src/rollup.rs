//! Plurality country and city for the nodes behind a bin

use crate::hexbin::Bin;
use crate::record::{NodeRecord, UNKNOWN};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Demographics {
    pub country: String,
    pub city: String,
    pub found: usize,   // Nodes matched back to the bin
}

impl Demographics {
    pub fn unknown() -> Self {
        Self {
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            found: 0,
        }
    }
}

/// Order-preserving tally: on equal counts the value seen first wins
struct Tally<'a> {
    counts: HashMap<&'a str, (usize, usize)>,   // value -> (count, first seen)
}

impl<'a> Tally<'a> {
    fn new() -> Self {
        Self { counts: HashMap::new() }
    }

    fn add(&mut self, value: &'a str) {
        let next = self.counts.len();
        self.counts.entry(value).or_insert((0, next)).0 += 1;
    }

    fn winner(&self) -> Option<&'a str> {
        self.counts
            .iter()
            .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
            .map(|(k, _)| *k)
    }
}

#[inline]
fn key(lng: f64, lat: f64) -> (u64, u64) {
    (lng.to_bits(), lat.to_bits())
}

/// Find the bin's members by exact coordinate match and take the plurality
/// country and city. One pass over `nodes`.
pub fn rollup(bin: &Bin, nodes: &[NodeRecord]) -> Demographics {
    let wanted: HashSet<(u64, u64)> = bin.points.iter().map(|&(lng, lat)| key(lng, lat)).collect();
    if wanted.is_empty() {
        return Demographics::unknown();
    }

    let mut countries = Tally::new();
    let mut cities = Tally::new();
    let mut found = 0;
    for node in nodes {
        if wanted.contains(&key(node.lng, node.lat)) {
            found += 1;
            countries.add(&node.country);
            cities.add(&node.city);
        }
    }

    if found == 0 {
        return Demographics::unknown();
    }

    Demographics {
        country: countries.winner().unwrap_or(UNKNOWN).to_string(),
        city: cities.winner().unwrap_or(UNKNOWN).to_string(),
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hexbin::HexBinner;
    use crate::record::Network;

    fn node(addr: &str, lat: f64, lng: f64, country: &str, city: &str) -> NodeRecord {
        NodeRecord::new(addr, lat, lng, Network::Clearnet).with_place(country, city)
    }

    #[test]
    fn plurality_wins() {
        let nodes = vec![
            node("a", 51.5, -0.12, "GB", "London"),
            node("b", 51.51, -0.13, "GB", "London"),
            node("c", 51.49, -0.11, "FR", "Calais"),
            node("d", 35.67, 139.65, "JP", "Tokyo"),
        ];
        let layer = HexBinner::default().bin_nodes(&nodes);
        let demo = rollup(&layer.bins[0], &nodes);
        assert_eq!(demo.country, "GB");
        assert_eq!(demo.city, "London");
        assert_eq!(demo.found, 3);
    }

    #[test]
    fn ties_go_to_first_seen() {
        let nodes = vec![
            node("a", 10.0, 10.0, "NL", "Amsterdam"),
            node("b", 10.1, 10.1, "DE", "Berlin"),
            node("c", 10.2, 10.2, "DE", "Amsterdam"),
            node("d", 10.3, 10.3, "NL", "Berlin"),
        ];
        let layer = HexBinner::default().bin_nodes(&nodes);
        assert_eq!(layer.bins.len(), 1);
        let demo = rollup(&layer.bins[0], &nodes);
        assert_eq!(demo.country, "NL");
        assert_eq!(demo.city, "Amsterdam");
    }

    #[test]
    fn no_matches_is_unknown() {
        let nodes = vec![node("a", 1.0, 1.0, "US", "Nowhere")];
        let layer = HexBinner::default().bin(vec![(50.0, 50.0)]);
        assert_eq!(rollup(&layer.bins[0], &nodes), Demographics::unknown());
        assert_eq!(rollup(&layer.bins[0], &[]), Demographics::unknown());
    }

    #[test]
    fn only_bin_members_count() {
        let nodes = vec![
            node("a", 10.0, 10.0, "NL", "Amsterdam"),
            node("b", -30.0, 100.0, "AU", "Perth"),
            node("c", -30.0, 100.0, "AU", "Perth"),
        ];
        let layer = HexBinner::default().bin_nodes(&nodes);
        let demo = rollup(&layer.bins[0], &nodes);
        assert_eq!(demo.found, 1);
        assert_eq!(demo.country, "NL");
    }
}
