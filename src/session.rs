//! One loaded dataset and everything derived from it
//!
//! A `Session` owns the pristine node lists, the current (possibly filtered)
//! hex layer and the hidden-node cloud. The renderer talks to it through
//! `hover`, `click` and `filter`, registers its listeners here, and calls
//! `teardown` when the view goes away.

use crate::classify::classify;
use crate::config::{HexbinConfig, HitTestConfig, PlacementConfig, SchemaConfig};
use crate::demo;
use crate::hexbin::{HexBinner, HexLayer};
use crate::hit_test::{HitOutcome, HitTester, PointerEvent};
use crate::placement::{HiddenPlacement, HiddenPlacer};
use crate::record::{parse_dataset, NodeRecord};
use crate::rollup::{rollup, Demographics};
use crate::settings::Settings;
use crate::source::{DatasetSource, LoadError};
use rand::Rng;

/// Globe spin per frame, radians
pub const GLOBE_ROTATION_SPEED: f64 = 0.002;

// ============================================================================
// Load bookkeeping
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum LoadNotice {
    NotLoaded,
    Live { source: String },
    /// Real data was unavailable; demo data is shown instead
    DemoFallback { reason: String },
}

impl LoadNotice {
    pub fn is_demo(&self) -> bool {
        matches!(self, LoadNotice::DemoFallback { .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub clearnet: usize,   // After filtering
    pub hidden: usize,
    pub total: usize,      // Records in the snapshot
}

#[derive(Clone, Debug)]
pub struct LoadReport {
    pub notice: LoadNotice,
    pub dropped: usize,
    pub totals: Totals,
}

// ============================================================================
// Payloads handed back to the renderer
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Tooltip {
    Region {
        country: String,
        city: String,
        nodes: usize,
        lat: f64,
        lng: f64,
        distance: f64,
        found: usize,
    },
    NoData {
        lat: f64,
        lng: f64,
        distance: f64,
    },
    Node {
        address: String,
        country: String,
        city: String,
        version: String,
    },
}

/// Something the user can click
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Bin(usize),
    Node(usize),     // Index into the filtered clearnet list
    Hidden(usize),
}

impl HitOutcome {
    pub fn entity(&self) -> Option<Entity> {
        match *self {
            HitOutcome::Bin { index, .. } => Some(Entity::Bin(index)),
            HitOutcome::Node { index, .. } => Some(Entity::Node(index)),
            HitOutcome::Hidden { index } => Some(Entity::Hidden(index)),
            HitOutcome::NoData { .. } | HitOutcome::NoMatch => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Detail {
    Region {
        nodes: usize,
        lat: f64,
        lng: f64,
        demographics: Demographics,
    },
    Node {
        address: String,
        country: String,
        city: String,
        version: String,
        location: Option<(f64, f64)>,   // None for hidden nodes
        last_seen: Option<String>,
    },
}

// ============================================================================
// Animation loop & listeners
// ============================================================================

/// Frame loop state driven by the renderer
#[derive(Debug, Default)]
pub struct AnimationLoop {
    running: bool,
    rotation_y: f64,
    frames: u64,
}

impl AnimationLoop {
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance one frame. Returns false once the loop has been stopped.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.frames += 1;
        self.rotation_y = (self.rotation_y + GLOBE_ROTATION_SPEED) % std::f64::consts::TAU;
        true
    }

    pub fn rotation_y(&self) -> f64 {
        self.rotation_y
    }

    pub fn set_rotation(&mut self, rotation_y: f64) {
        self.rotation_y = rotation_y;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

type Detach = Box<dyn FnOnce()>;

struct Listener {
    name: String,
    detach: Detach,
}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    clearnet: Vec<NodeRecord>,     // Pristine, read-only after load
    hidden: Vec<NodeRecord>,
    placements: Vec<HiddenPlacement>,
    filtered: Vec<NodeRecord>,
    layer: HexLayer,
    query: String,
    totals: Totals,
    notice: LoadNotice,
    dropped: usize,
    binner: HexBinner,
    tester: HitTester,
    placer: HiddenPlacer,
    schema: SchemaConfig,
    animation: AnimationLoop,
    listeners: Vec<Listener>,
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Self::with_config(
            settings.hexbin.clone(),
            settings.hit_test.clone(),
            settings.placement.clone(),
            settings.schema.clone(),
        )
    }

    pub fn with_config(
        hexbin: HexbinConfig,
        hit_test: HitTestConfig,
        placement: PlacementConfig,
        schema: SchemaConfig,
    ) -> Self {
        let globe_radius = hit_test.globe_radius;
        Self {
            clearnet: Vec::new(),
            hidden: Vec::new(),
            placements: Vec::new(),
            filtered: Vec::new(),
            layer: HexLayer::default(),
            query: String::new(),
            totals: Totals::default(),
            notice: LoadNotice::NotLoaded,
            dropped: 0,
            binner: HexBinner::new(hexbin),
            tester: HitTester::new(hit_test),
            placer: HiddenPlacer::new(placement, globe_radius),
            schema,
            animation: AnimationLoop::default(),
            listeners: Vec::new(),
        }
    }

    /// Fetch, classify, bin and place. Any fetch or parse failure swaps in
    /// demo data and is reported through the returned notice.
    pub fn load_and_process<R: Rng + ?Sized>(&mut self, source: &dyn DatasetSource, rng: &mut R) -> LoadReport {
        let fetched = source
            .fetch()
            .and_then(|text| parse_dataset(&text).map_err(LoadError::Parse));

        match fetched {
            Ok((records, total)) => {
                let classified = classify(records, &self.schema, rng);
                log::info!(
                    "Loaded {} clearnet nodes and {} hidden nodes from {}",
                    classified.clearnet.len(),
                    classified.hidden.len(),
                    source.describe()
                );
                if classified.dropped > 0 {
                    log::warn!("Dropped {} records without usable coordinates", classified.dropped);
                }
                self.clearnet = classified.clearnet;
                self.hidden = classified.hidden;
                self.dropped = classified.dropped;
                self.totals.total = total;
                self.notice = LoadNotice::Live { source: source.describe() };
            }
            Err(e) => {
                log::warn!("Error loading data: {}. Using demo mode.", e);
                let data = demo::generate(rng);
                log::info!(
                    "Loaded {} clearnet nodes and {} hidden nodes (demo)",
                    data.clearnet.len(),
                    data.hidden.len()
                );
                self.totals.total = data.total();
                self.clearnet = data.clearnet;
                self.hidden = data.hidden;
                self.dropped = 0;
                self.notice = LoadNotice::DemoFallback { reason: e.to_string() };
            }
        }

        self.placements = self.placer.place(&self.hidden, rng);
        self.totals.hidden = self.hidden.len();
        self.query.clear();
        self.filter("");

        LoadReport {
            notice: self.notice.clone(),
            dropped: self.dropped,
            totals: self.totals,
        }
    }

    /// Re-bin the clearnet nodes whose address contains `query`
    /// (case-insensitive). Always starts from the pristine list.
    pub fn filter(&mut self, query: &str) -> Totals {
        let needle = query.trim().to_lowercase();
        self.filtered = if needle.is_empty() {
            self.clearnet.clone()
        } else {
            self.clearnet
                .iter()
                .filter(|n| n.address.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        };
        self.layer = self.binner.bin_nodes(&self.filtered);
        self.query = needle;
        self.totals.clearnet = self.filtered.len();
        log::debug!(
            "Filter {:?}: {} nodes in {} bins",
            self.query,
            self.filtered.len(),
            self.layer.bins.len()
        );
        self.totals
    }

    /// Hit-test against density bins, compensating for the current spin
    pub fn resolve(&self, event: &PointerEvent) -> HitOutcome {
        self.tester
            .resolve_bins(event, self.animation.rotation_y(), &self.layer, self.placements.len())
    }

    /// Hit-test against individual clearnet nodes
    pub fn resolve_node(&self, event: &PointerEvent) -> HitOutcome {
        self.tester
            .resolve_nodes(event, self.animation.rotation_y(), &self.filtered, self.placements.len())
    }

    /// Tooltip for the bin (or hidden node) under the pointer, if any
    pub fn hover(&self, event: &PointerEvent) -> Option<Tooltip> {
        self.tooltip(self.resolve(event))
    }

    /// Tooltip for the individual node under the pointer, if any
    pub fn hover_node(&self, event: &PointerEvent) -> Option<Tooltip> {
        self.tooltip(self.resolve_node(event))
    }

    fn tooltip(&self, outcome: HitOutcome) -> Option<Tooltip> {
        match outcome {
            HitOutcome::Bin { index, lat, lng, distance } => {
                let bin = self.layer.bins.get(index)?;
                let demographics = rollup(bin, &self.filtered);
                Some(Tooltip::Region {
                    country: demographics.country,
                    city: demographics.city,
                    nodes: bin.weight,
                    lat,
                    lng,
                    distance,
                    found: demographics.found,
                })
            }
            HitOutcome::Node { index, .. } => self.filtered.get(index).map(node_tooltip),
            HitOutcome::Hidden { index } => self.hidden.get(index).map(node_tooltip),
            HitOutcome::NoData { lat, lng, distance } => Some(Tooltip::NoData { lat, lng, distance }),
            HitOutcome::NoMatch => None,
        }
    }

    /// Detail panel contents for a clicked entity
    pub fn click(&self, entity: Entity) -> Option<Detail> {
        match entity {
            Entity::Bin(index) => {
                let bin = self.layer.bins.get(index)?;
                Some(Detail::Region {
                    nodes: bin.weight,
                    lat: bin.lat,
                    lng: bin.lng,
                    demographics: rollup(bin, &self.filtered),
                })
            }
            Entity::Node(index) => self.filtered.get(index).map(|n| node_detail(n, true)),
            Entity::Hidden(index) => self.hidden.get(index).map(|n| node_detail(n, false)),
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Register a pointer/resize listener; `detach` runs on teardown
    pub fn register_listener(&mut self, name: impl Into<String>, detach: impl FnOnce() + 'static) {
        self.listeners.push(Listener {
            name: name.into(),
            detach: Box::new(detach),
        });
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn animation(&self) -> &AnimationLoop {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationLoop {
        &mut self.animation
    }

    /// Stop the frame loop, detach every listener and drop derived layers.
    /// Safe to call repeatedly and on a session that never finished loading.
    pub fn teardown(&mut self) {
        self.animation.stop();
        for listener in self.listeners.drain(..) {
            log::debug!("Detaching {}", listener.name);
            (listener.detach)();
        }
        self.layer = HexLayer::default();
        self.filtered.clear();
        self.placements.clear();
        self.totals.clearnet = 0;
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn clearnet(&self) -> &[NodeRecord] {
        &self.clearnet
    }

    pub fn hidden(&self) -> &[NodeRecord] {
        &self.hidden
    }

    pub fn filtered(&self) -> &[NodeRecord] {
        &self.filtered
    }

    pub fn placements(&self) -> &[HiddenPlacement] {
        &self.placements
    }

    pub fn layer(&self) -> &HexLayer {
        &self.layer
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn notice(&self) -> &LoadNotice {
        &self.notice
    }

    pub fn binner(&self) -> &HexBinner {
        &self.binner
    }

    pub fn tester(&self) -> &HitTester {
        &self.tester
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn node_tooltip(node: &NodeRecord) -> Tooltip {
    Tooltip::Node {
        address: node.address.clone(),
        country: node.country.clone(),
        city: node.city.clone(),
        version: node.version.clone(),
    }
}

fn node_detail(node: &NodeRecord, located: bool) -> Detail {
    Detail::Node {
        address: node.address.clone(),
        country: node.country.clone(),
        city: node.city.clone(),
        version: node.version.clone(),
        location: located.then_some((node.lat, node.lng)),
        last_seen: node
            .last_seen
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string()),
    }
}
