//! Plain-text rendering of a session for the terminal

use crate::colors::{Rgb, HIGH, LOW, MID};
use crate::hexbin::{Bin, HexLayer};
use crate::rollup::rollup;
use crate::session::{Detail, LoadNotice, LoadReport, Session, Tooltip, Totals};
use crossterm::queue;
use crossterm::style::{Print, ResetColor, SetForegroundColor};
use std::io::{self, Write};

const SWATCH: &str = "██";

fn swatch<W: Write>(out: &mut W, color: Rgb) -> io::Result<()> {
    queue!(out, SetForegroundColor(color.to_color()), Print(SWATCH), ResetColor)
}

/// Tooltip text, one line per row
pub fn tooltip_lines(tooltip: &Tooltip) -> Vec<String> {
    match tooltip {
        Tooltip::Region { country, city, nodes, lat, lng, distance, found } => vec![
            "Region Info".to_string(),
            format!("Country: {}", country),
            format!("City: {}", city),
            format!("Nodes: {}", nodes),
            format!("Lat: {:.2}°  Lng: {:.2}°", lat, lng),
            format!("Distance: {:.2}", distance),
            format!("Nodes Found: {}", found),
        ],
        Tooltip::NoData { lat, lng, distance } => {
            let distance = if distance.is_finite() {
                format!("{:.2}", distance)
            } else {
                "N/A".to_string()
            };
            vec![
                "No Data".to_string(),
                format!("Lat: {:.2}°  Lng: {:.2}°", lat, lng),
                format!("Nearest bin: {}", distance),
            ]
        }
        Tooltip::Node { address, country, city, version } => vec![
            "Node Info".to_string(),
            format!("Address: {}", address),
            format!("Country: {}", country),
            format!("City: {}", city),
            format!("Version: {}", version),
        ],
    }
}

pub fn detail_lines(detail: &Detail) -> Vec<String> {
    match detail {
        Detail::Region { nodes, lat, lng, demographics } => vec![
            format!("Nodes in Region: {}", nodes),
            format!("Latitude: {:.2}°", lat),
            format!("Longitude: {:.2}°", lng),
            format!("Country: {}", demographics.country),
            format!("City: {}", demographics.city),
        ],
        Detail::Node { address, country, city, version, location, last_seen } => {
            let mut lines = vec![
                format!("Node Address: {}", address),
                format!("Country: {}", country),
                format!("City: {}", city),
                format!("Version: {}", version),
            ];
            if let Some((lat, lng)) = location {
                lines.push(format!("Latitude: {:.2}°", lat));
                lines.push(format!("Longitude: {:.2}°", lng));
            }
            if let Some(seen) = last_seen {
                lines.push(format!("Last Seen: {}", seen));
            }
            lines
        }
    }
}

pub fn totals_line(totals: &Totals) -> String {
    format!(
        "Clearnet Nodes: {}  Hidden Nodes: {}  Total Nodes: {}",
        totals.clearnet, totals.hidden, totals.total
    )
}

pub fn notice_line(notice: &LoadNotice) -> String {
    match notice {
        LoadNotice::NotLoaded => "Not loaded".to_string(),
        LoadNotice::Live { source } => format!("Source: {}", source),
        LoadNotice::DemoFallback { reason } => format!("Error loading data ({}). Using demo mode.", reason),
    }
}

pub fn write_load_report<W: Write>(out: &mut W, report: &LoadReport) -> io::Result<()> {
    writeln!(out, "{}", notice_line(&report.notice))?;
    writeln!(out, "{}", totals_line(&report.totals))?;
    if report.dropped > 0 {
        writeln!(out, "Dropped records: {}", report.dropped)?;
    }
    Ok(())
}

/// Color legend for the density gradient
pub fn write_legend<W: Write>(out: &mut W, layer: &HexLayer) -> io::Result<()> {
    write!(out, "Density ")?;
    swatch(out, LOW)?;
    write!(out, " 0  ")?;
    swatch(out, MID)?;
    write!(out, " {:.0}  ", layer.max_value / 2.0)?;
    swatch(out, HIGH)?;
    writeln!(out, " {:.0}+", layer.max_value)
}

fn write_bin_row<W: Write>(out: &mut W, bin: &Bin, session: &Session) -> io::Result<()> {
    swatch(out, bin.color)?;
    let who = rollup(bin, session.filtered());
    writeln!(
        out,
        " {:>8} {:>8.2} {:>8.2} {:>6} {:>5.3}  {} / {}",
        bin.id.to_string(),
        bin.lat,
        bin.lng,
        bin.weight,
        bin.altitude,
        who.country,
        who.city
    )
}

/// Bins sorted by weight, heaviest first
pub fn write_bins<W: Write>(out: &mut W, session: &Session, limit: usize) -> io::Result<()> {
    let layer = session.layer();
    write_legend(out, layer)?;
    writeln!(
        out,
        "   {:>8} {:>8} {:>8} {:>6} {:>5}  Country / City",
        "cell", "lat", "lng", "nodes", "alt"
    )?;

    let mut bins: Vec<&Bin> = layer.bins.iter().collect();
    bins.sort_by(|a, b| b.weight.cmp(&a.weight));
    for bin in bins.iter().take(limit) {
        write_bin_row(out, bin, session)?;
    }
    if bins.len() > limit {
        writeln!(out, "   ... {} more bins", bins.len() - limit)?;
    }
    Ok(())
}

/// Connected regions of adjacent bins
pub fn write_regions<W: Write>(out: &mut W, session: &Session, limit: usize) -> io::Result<()> {
    let mut regions = session.layer().merged();
    regions.sort_by(|a, b| b.weight.cmp(&a.weight));
    writeln!(out, "{:>8} {:>8} {:>6} {:>6}", "lat", "lng", "cells", "nodes")?;
    for region in regions.iter().take(limit) {
        writeln!(
            out,
            "{:>8.2} {:>8.2} {:>6} {:>6}",
            region.lat,
            region.lng,
            region.cells.len(),
            region.weight
        )?;
    }
    Ok(())
}

/// Hidden-node cloud summary
pub fn write_hidden<W: Write>(out: &mut W, session: &Session, limit: usize) -> io::Result<()> {
    for placement in session.placements().iter().take(limit) {
        queue!(out, SetForegroundColor(placement.tint.to_color()), Print("●"), ResetColor)?;
        let p = placement.position;
        writeln!(
            out,
            " {:<40} ({:>7.1}, {:>7.1}, {:>7.1}) r={:.1}",
            placement.address,
            p.x,
            p.y,
            p.z,
            p.length()
        )?;
    }
    if session.placements().len() > limit {
        writeln!(out, "... {} more hidden nodes", session.placements().len() - limit)?;
    }
    Ok(())
}

pub fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "  {}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup::Demographics;

    #[test]
    fn region_tooltip_fields() {
        let lines = tooltip_lines(&Tooltip::Region {
            country: "GB".into(),
            city: "London".into(),
            nodes: 12,
            lat: 51.5,
            lng: -0.125,
            distance: 0.5,
            found: 12,
        });
        assert_eq!(lines[0], "Region Info");
        assert!(lines.contains(&"Country: GB".to_string()));
        assert!(lines.contains(&"Nodes: 12".to_string()));
        assert!(lines.contains(&"Nodes Found: 12".to_string()));
    }

    #[test]
    fn no_data_with_empty_layer() {
        let lines = tooltip_lines(&Tooltip::NoData { lat: 1.0, lng: 2.0, distance: f64::INFINITY });
        assert_eq!(lines.last().map(String::as_str), Some("Nearest bin: N/A"));
    }

    #[test]
    fn hidden_node_detail_has_no_location() {
        let lines = detail_lines(&Detail::Node {
            address: "abc.onion:8333".into(),
            country: "Unknown".into(),
            city: "Unknown".into(),
            version: "27.0".into(),
            location: None,
            last_seen: Some("2024-01-01 00:00 UTC".into()),
        });
        assert!(!lines.iter().any(|l| l.starts_with("Latitude")));
        assert_eq!(lines.last().map(String::as_str), Some("Last Seen: 2024-01-01 00:00 UTC"));

        let region = detail_lines(&Detail::Region {
            nodes: 3,
            lat: 10.0,
            lng: 20.0,
            demographics: Demographics::unknown(),
        });
        assert_eq!(region[0], "Nodes in Region: 3");
    }

    #[test]
    fn legend_uses_truecolor() {
        let layer = HexLayer { bins: Vec::new(), total: 200, max_value: 10.0 };
        let mut out = Vec::new();
        write_legend(&mut out, &layer).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("38;2;0;255;255"));
        assert!(text.contains("10+"));
    }
}
