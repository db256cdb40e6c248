//! Node records and the two dataset schemas
//!
//! Snapshots arrive as a JSON object keyed by node address. Each value is
//! either an object with named fields or a fixed-position array. Both shapes
//! are read into `RawRecord` and normalized into `NodeRecord` before any
//! geometry happens.

use crate::config::PositionalLayout;
use serde::Deserialize;
use serde_json::Value;

pub const UNKNOWN: &str = "Unknown";

/// Address suffix used by the anonymity overlay
pub const ONION_SUFFIX: &str = ".onion";

// ============================================================================
// Classification
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Network {
    Clearnet,
    Hidden,
}

/// Where a record's coordinates came from
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CoordSource {
    Reported,
    CountryCentroid,
    Random,
}

impl CoordSource {
    pub fn is_substituted(&self) -> bool {
        *self != CoordSource::Reported
    }
}

// ============================================================================
// Raw shapes
// ============================================================================

/// Object-shaped record
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NamedFields {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub addr_family: Option<String>,
}

#[derive(Clone, Debug)]
pub enum RawRecord {
    Named(NamedFields),
    Positional(Vec<Value>),
}

/// Which schema a record came from (drop policy is chosen per schema)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Schema {
    Named,
    Positional,
}

impl RawRecord {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            // Every field is lenient, so a wrong-typed field never loses the record
            Value::Object(_) => Some(RawRecord::Named(serde_json::from_value(value).unwrap_or_default())),
            Value::Array(slots) => Some(RawRecord::Positional(slots)),
            _ => None,
        }
    }

    pub fn schema(&self) -> Schema {
        match self {
            RawRecord::Named(_) => Schema::Named,
            RawRecord::Positional(_) => Schema::Positional,
        }
    }

    /// Reported (lat, lng), unvalidated
    pub fn coordinates(&self, layout: &PositionalLayout) -> (Option<f64>, Option<f64>) {
        match self {
            RawRecord::Named(f) => (f.latitude, f.longitude),
            RawRecord::Positional(slots) => (
                slot_f64(slots, layout.latitude),
                slot_f64(slots, layout.longitude),
            ),
        }
    }

    pub fn country(&self, layout: &PositionalLayout) -> Option<String> {
        match self {
            RawRecord::Named(f) => non_empty(f.country.clone()),
            RawRecord::Positional(slots) => slot_str(slots, layout.country),
        }
    }

    fn city(&self, layout: &PositionalLayout) -> Option<String> {
        match self {
            RawRecord::Named(f) => non_empty(f.city.clone()),
            RawRecord::Positional(slots) => slot_str(slots, layout.city),
        }
    }

    fn user_agent(&self, layout: &PositionalLayout) -> Option<String> {
        match self {
            RawRecord::Named(f) => non_empty(f.user_agent.clone()),
            RawRecord::Positional(slots) => slot_str(slots, layout.user_agent),
        }
    }

    /// Network membership as declared by the record itself, before the
    /// address suffix is consulted
    pub fn declares_hidden(&self, layout: &PositionalLayout) -> bool {
        match self {
            RawRecord::Named(f) => f
                .addr_family
                .as_deref()
                .is_some_and(|fam| fam.eq_ignore_ascii_case("onion")),
            RawRecord::Positional(slots) => slots.get(layout.tor_flag).is_some_and(truthy),
        }
    }

    /// Normalize into a canonical record at the given coordinates
    pub fn into_node(
        self,
        address: String,
        (lat, lng): (f64, f64),
        source: CoordSource,
        network: Network,
        layout: &PositionalLayout,
    ) -> NodeRecord {
        let user_agent = self.user_agent(layout);
        let explicit_version = match &self {
            RawRecord::Positional(slots) => slot_str(slots, layout.version),
            RawRecord::Named(_) => None,
        };
        let version = explicit_version
            .or_else(|| user_agent.as_deref().and_then(version_from_user_agent))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let (protocol, last_seen, asn, height) = match &self {
            RawRecord::Positional(slots) => (
                slot_f64(slots, layout.protocol).map(|v| v as u32),
                slot_f64(slots, layout.last_seen).map(|v| v as i64),
                slot_str(slots, layout.asn),
                slot_f64(slots, layout.height).map(|v| v as u64),
            ),
            RawRecord::Named(_) => (None, None, None, None),
        };

        NodeRecord {
            country: self.country(layout).unwrap_or_else(|| UNKNOWN.to_string()),
            city: self.city(layout).unwrap_or_else(|| UNKNOWN.to_string()),
            address,
            lat,
            lng,
            version,
            network,
            coord_source: source,
            user_agent,
            protocol,
            last_seen,
            asn,
            height,
        }
    }
}

// ============================================================================
// Canonical record
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub country: String,
    pub city: String,
    pub version: String,
    pub network: Network,
    pub coord_source: CoordSource,
    pub user_agent: Option<String>,
    pub protocol: Option<u32>,
    pub last_seen: Option<i64>,  // Unix seconds
    pub asn: Option<String>,
    pub height: Option<u64>,
}

impl NodeRecord {
    /// Minimal record, used by demo data and tests
    pub fn new(address: impl Into<String>, lat: f64, lng: f64, network: Network) -> Self {
        Self {
            address: address.into(),
            lat,
            lng,
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
            network,
            coord_source: CoordSource::Reported,
            user_agent: None,
            protocol: None,
            last_seen: None,
            asn: None,
            height: None,
        }
    }

    pub fn with_place(mut self, country: &str, city: &str) -> Self {
        self.country = country.to_string();
        self.city = city.to_string();
        self
    }
}

// ============================================================================
// Dataset parsing
// ============================================================================

/// Parse a snapshot into (address, record) pairs in document order.
/// Values that are neither objects nor arrays are skipped.
pub fn parse_dataset(text: &str) -> Result<(Vec<(String, RawRecord)>, usize), String> {
    let root: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let Value::Object(map) = root else {
        return Err("dataset root is not an object".to_string());
    };

    let total = map.len();
    let mut records = Vec::with_capacity(total);
    for (address, value) in map {
        match RawRecord::from_value(value) {
            Some(raw) => records.push((address, raw)),
            None => log::warn!("Skipping unreadable record for {}", address),
        }
    }
    Ok((records, total))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// "/Satoshi:25.0.0/" -> "25.0.0"
pub fn version_from_user_agent(ua: &str) -> Option<String> {
    let tail = ua.split(':').nth(1)?;
    let version = tail.split('/').next()?.trim();
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn value_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn slot_f64(slots: &[Value], idx: usize) -> Option<f64> {
    slots.get(idx).and_then(value_f64)
}

fn value_str(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => non_empty(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn slot_str(slots: &[Value], idx: usize) -> Option<String> {
    slots.get(idx).and_then(value_str)
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "tor" | "onion"),
        _ => false,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_f64))
}

/// Text field that tolerates numbers (kept as their text) and drops any
/// other type instead of failing the whole record
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn version_parsing() {
        assert_eq!(version_from_user_agent("/Satoshi:25.0.0/").as_deref(), Some("25.0.0"));
        assert_eq!(version_from_user_agent("/btcd:0.24.0/").as_deref(), Some("0.24.0"));
        assert_eq!(version_from_user_agent("garbage"), None);
        assert_eq!(version_from_user_agent("/Satoshi:/"), None);
    }

    #[test]
    fn named_record_reads_fields() {
        let raw = RawRecord::from_value(json!({
            "latitude": 52.37,
            "longitude": "4.89",
            "country": "NL",
            "city": "Amsterdam",
            "user_agent": "/Satoshi:26.0.0/",
        }))
        .unwrap();
        let layout = PositionalLayout::default();
        assert_eq!(raw.schema(), Schema::Named);
        assert_eq!(raw.coordinates(&layout), (Some(52.37), Some(4.89)));
        assert!(!raw.declares_hidden(&layout));

        let node = raw.into_node(
            "1.2.3.4:8333".into(),
            (52.37, 4.89),
            CoordSource::Reported,
            Network::Clearnet,
            &layout,
        );
        assert_eq!(node.country, "NL");
        assert_eq!(node.city, "Amsterdam");
        assert_eq!(node.version, "26.0.0");
    }

    #[test]
    fn wrong_typed_named_fields_keep_the_record() {
        let layout = PositionalLayout::default();
        let raw = RawRecord::from_value(json!({
            "latitude": 51.5,
            "longitude": -0.12,
            "country": "GB",
            "city": 5,
            "user_agent": 70016,
            "addr_family": ["onion"],
        }))
        .unwrap();
        assert_eq!(raw.schema(), Schema::Named);
        assert_eq!(raw.coordinates(&layout), (Some(51.5), Some(-0.12)));
        assert_eq!(raw.country(&layout).as_deref(), Some("GB"));
        assert!(!raw.declares_hidden(&layout));

        let node = raw.into_node("1.2.3.4:8333".into(), (51.5, -0.12), CoordSource::Reported, Network::Clearnet, &layout);
        assert_eq!(node.city, "5");
        assert_eq!(node.user_agent.as_deref(), Some("70016"));

        let odd = RawRecord::from_value(json!({"latitude": {"deg": 1}, "country": null, "city": true})).unwrap();
        assert_eq!(odd.coordinates(&layout), (None, None));
        assert_eq!(odd.country(&layout), None);
    }

    #[test]
    fn positional_record_reads_slots() {
        let raw = RawRecord::from_value(json!([
            70016, "/Satoshi:24.0.1/", 1700000000, "AS3320", 820000,
            "DE", "Berlin", 52.52, 13.405, null, "24.0.1-custom", false
        ]))
        .unwrap();
        let layout = PositionalLayout::default();
        assert_eq!(raw.schema(), Schema::Positional);
        assert_eq!(raw.coordinates(&layout), (Some(52.52), Some(13.405)));
        assert!(!raw.declares_hidden(&layout));

        let node = raw.into_node(
            "5.6.7.8:8333".into(),
            (52.52, 13.405),
            CoordSource::Reported,
            Network::Clearnet,
            &layout,
        );
        assert_eq!(node.version, "24.0.1-custom");
        assert_eq!(node.protocol, Some(70016));
        assert_eq!(node.last_seen, Some(1_700_000_000));
        assert_eq!(node.asn.as_deref(), Some("AS3320"));
        assert_eq!(node.height, Some(820_000));
        assert_eq!(node.country, "DE");
    }

    #[test]
    fn positional_tor_flag() {
        let layout = PositionalLayout::default();
        let mut slots = vec![Value::Null; 12];
        slots[11] = json!(true);
        assert!(RawRecord::Positional(slots.clone()).declares_hidden(&layout));
        slots[11] = json!(0);
        assert!(!RawRecord::Positional(slots).declares_hidden(&layout));
    }

    #[test]
    fn short_array_has_no_coordinates() {
        let raw = RawRecord::Positional(vec![json!(70016)]);
        let layout = PositionalLayout::default();
        assert_eq!(raw.coordinates(&layout), (None, None));
        let node = raw.into_node("x".into(), (0.0, 0.0), CoordSource::Random, Network::Clearnet, &layout);
        assert_eq!(node.country, UNKNOWN);
        assert_eq!(node.version, UNKNOWN);
    }

    #[test]
    fn dataset_keeps_document_order() {
        let text = r#"{"b:1": {"country": "US"}, "a:2": [1], "c:3": 42}"#;
        let (records, total) = parse_dataset(text).unwrap();
        assert_eq!(total, 3);
        let keys: Vec<_> = records.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b:1", "a:2"]);
    }

    #[test]
    fn dataset_rejects_non_object_root() {
        assert!(parse_dataset("[1, 2]").is_err());
        assert!(parse_dataset("{not json").is_err());
    }
}
