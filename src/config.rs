use serde::Deserialize;

/// Hex binning and bar styling
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HexbinConfig {
    pub radius_deg: f64,          // Hex radius in degrees of lng/lat
    pub max_value_divisor: f64,   // Color saturates at total / divisor
    pub altitude_multiplier: f64,
    pub max_altitude: f64,
}

impl Default for HexbinConfig {
    fn default() -> Self {
        Self {
            radius_deg: 5.0,
            max_value_divisor: 20.0,
            altitude_multiplier: 0.02,
            max_altitude: 0.3,
        }
    }
}

/// Hit-test tolerances and globe geometry
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HitTestConfig {
    pub bin_threshold_deg: f64,
    pub node_threshold_deg: f64,
    pub globe_radius: f64,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            bin_threshold_deg: 10.0,
            node_threshold_deg: 5.0,
            globe_radius: 100.0,
        }
    }
}

/// How hidden nodes are scattered around the globe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStrategy {
    Polar,  // Two clouds hovering over the poles
    Shell,  // Uniform spherical shell around the globe
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub strategy: PlacementStrategy,
    pub pole_lat_deg: f64,       // Avoid the exact poles
    pub cone_half_angle: f64,    // Radians
    pub offset_min: f64,
    pub offset_max: f64,
    pub shell_base_radius: f64,
    pub shell_max_radius: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            strategy: PlacementStrategy::Polar,
            pole_lat_deg: 80.0,
            cone_half_angle: std::f64::consts::PI / 6.0,
            offset_min: 5.0,
            offset_max: 20.0,
            shell_base_radius: 120.0,
            shell_max_radius: 150.0,
        }
    }
}

/// What to do with a clearnet record whose reported coordinates are unusable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidCoordPolicy {
    Retain,  // Keep it at the substituted position
    Drop,    // Leave it out of the dataset
}

/// Slot indices for array-shaped records
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PositionalLayout {
    pub protocol: usize,
    pub user_agent: usize,
    pub last_seen: usize,
    pub asn: usize,
    pub height: usize,
    pub country: usize,
    pub city: usize,
    pub latitude: usize,
    pub longitude: usize,
    pub version: usize,
    pub tor_flag: usize,
}

impl Default for PositionalLayout {
    fn default() -> Self {
        Self {
            protocol: 0,
            user_agent: 1,
            last_seen: 2,
            asn: 3,
            height: 4,
            country: 5,
            city: 6,
            latitude: 7,
            longitude: 8,
            version: 10,
            tor_flag: 11,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub named_policy: InvalidCoordPolicy,
    pub positional_policy: InvalidCoordPolicy,
    pub layout: PositionalLayout,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            named_policy: InvalidCoordPolicy::Retain,
            positional_policy: InvalidCoordPolicy::Drop,
            layout: PositionalLayout::default(),
        }
    }
}
