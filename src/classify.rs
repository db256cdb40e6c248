//! Split raw records into clearnet and hidden nodes

use crate::config::{InvalidCoordPolicy, SchemaConfig};
use crate::record::{Network, NodeRecord, RawRecord, Schema, ONION_SUFFIX};
use crate::sanitize::{round_coord, sanitize};
use rand::Rng;

/// Result of classifying one snapshot. Both lists keep input order.
#[derive(Debug, Default)]
pub struct Classified {
    pub clearnet: Vec<NodeRecord>,
    pub hidden: Vec<NodeRecord>,
    pub dropped: usize,
}

pub fn network_of(address: &str, raw: &RawRecord, schema: &SchemaConfig) -> Network {
    if raw.declares_hidden(&schema.layout) || address.to_ascii_lowercase().contains(ONION_SUFFIX) {
        Network::Hidden
    } else {
        Network::Clearnet
    }
}

fn policy_for(schema: Schema, config: &SchemaConfig) -> InvalidCoordPolicy {
    match schema {
        Schema::Named => config.named_policy,
        Schema::Positional => config.positional_policy,
    }
}

/// Sanitize and partition every record.
///
/// Clearnet records whose reported coordinates needed substitution are kept
/// or dropped according to their schema's policy. Hidden records are never
/// dropped; their coordinates are not used for placement.
pub fn classify<R: Rng + ?Sized>(
    records: Vec<(String, RawRecord)>,
    config: &SchemaConfig,
    rng: &mut R,
) -> Classified {
    let mut out = Classified::default();
    let layout = &config.layout;

    for (address, raw) in records {
        let network = network_of(&address, &raw, config);
        let (lat, lng) = raw.coordinates(layout);
        let country = raw.country(layout);
        let ((lat, lng), source) = sanitize(lat, lng, country.as_deref(), rng);

        if network == Network::Clearnet
            && source.is_substituted()
            && policy_for(raw.schema(), config) == InvalidCoordPolicy::Drop
        {
            log::debug!("Dropping {}: no usable coordinates", address);
            out.dropped += 1;
            continue;
        }

        let node = raw.into_node(address, (round_coord(lat), round_coord(lng)), source, network, layout);
        match network {
            Network::Clearnet => out.clearnet.push(node),
            Network::Hidden => out.hidden.push(node),
        }
    }

    out
}
