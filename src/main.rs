use clap::{Parser, Subcommand};
use nodeglobe::config::PlacementStrategy;
use nodeglobe::globe::polar_to_cartesian;
use nodeglobe::hit_test::PointerEvent;
use nodeglobe::{report, source, view, Session, Settings};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nodeglobe")]
#[command(version)]
#[command(about = "Geographic density of peer-to-peer network nodes, clearnet and hidden", long_about = None)]
struct Cli {
    /// Local node snapshot (JSON), overrides the config file
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Remote node snapshot URL, overrides the config file
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Only keep clearnet nodes whose address contains this text
    #[arg(short, long, global = true)]
    filter: Option<String>,

    /// Random seed for reproducibility
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Hidden node placement: polar or shell
    #[arg(long, global = true)]
    strategy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the snapshot and print node totals
    Stats,

    /// List density bins, heaviest first
    Bins {
        /// Maximum rows to print
        #[arg(short, long, default_value = "25")]
        limit: usize,

        /// Show connected regions of adjacent bins instead
        #[arg(short, long)]
        merged: bool,
    },

    /// List synthetic positions of hidden nodes
    Hidden {
        /// Maximum rows to print
        #[arg(short, long, default_value = "25")]
        limit: usize,
    },

    /// Hit-test a point on the globe and show what is there
    Probe {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Match individual nodes instead of bins
        #[arg(short, long)]
        nodes: bool,

        /// Globe rotation around the vertical axis (radians)
        #[arg(short, long, default_value = "0.0", allow_hyphen_values = true)]
        rotation: f64,
    },

    /// Dump bins and hidden placements as JSON for a renderer
    Export,

    /// Spinning globe in the terminal
    View {
        /// Print a single frame to stdout (no interactive display)
        #[arg(long)]
        print: bool,

        /// Animation speed (seconds per frame)
        #[arg(short, long, default_value = "0.05")]
        time: f32,
    },
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(path) = cli.path {
        settings.data.path = Some(path);
    }
    if let Some(url) = cli.url {
        settings.data.url = Some(url);
    }
    if let Some(strategy) = cli.strategy {
        settings.placement.strategy = match strategy.to_lowercase().as_str() {
            "polar" | "poles" => PlacementStrategy::Polar,
            "shell" | "sphere" => PlacementStrategy::Shell,
            _ => {
                eprintln!("Unknown strategy: {}. Using polar.", strategy);
                eprintln!("Available: polar, shell");
                PlacementStrategy::Polar
            }
        };
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut session = Session::new(&settings);
    let load = session.load_and_process(&*source::from_settings(&settings.data), &mut rng);
    if let Some(query) = &cli.filter {
        session.filter(query);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Stats => {
            report::write_load_report(&mut out, &load)?;
            if cli.filter.is_some() {
                writeln!(out, "After filter: {}", report::totals_line(&session.totals()))?;
            }
            writeln!(
                out,
                "Bins: {}  Max value: {:.2}",
                session.layer().bins.len(),
                session.layer().max_value
            )?;
        }
        Commands::Bins { limit, merged } => {
            if merged {
                report::write_regions(&mut out, &session, limit)?;
            } else {
                report::write_bins(&mut out, &session, limit)?;
            }
        }
        Commands::Hidden { limit } => {
            report::write_hidden(&mut out, &session, limit)?;
        }
        Commands::Probe { lat, lng, nodes, rotation } => {
            session.animation_mut().set_rotation(rotation);
            let radius = session.tester().config().globe_radius;
            let event = PointerEvent::Globe {
                point: polar_to_cartesian(lat, lng, radius).rotate_y(rotation),
            };
            let outcome = if nodes { session.resolve_node(&event) } else { session.resolve(&event) };
            let tooltip = if nodes { session.hover_node(&event) } else { session.hover(&event) };

            match tooltip {
                Some(tooltip) => report::write_lines(&mut out, &report::tooltip_lines(&tooltip))?,
                None => writeln!(out, "Nothing here")?,
            }
            if let Some(detail) = outcome.entity().and_then(|e| session.click(e)) {
                writeln!(out)?;
                report::write_lines(&mut out, &report::detail_lines(&detail))?;
            }
        }
        Commands::Export => {
            let bins: Vec<_> = session
                .layer()
                .bins
                .iter()
                .map(|b| {
                    json!({
                        "id": b.id.to_string(),
                        "lat": b.lat,
                        "lng": b.lng,
                        "weight": b.weight,
                        "color": b.color.css(),
                        "altitude": b.altitude,
                    })
                })
                .collect();
            let hidden: Vec<_> = session
                .placements()
                .iter()
                .map(|p| {
                    json!({
                        "address": p.address,
                        "position": [p.position.x, p.position.y, p.position.z],
                        "color": p.tint.rgb_f32(),
                    })
                })
                .collect();
            let doc = json!({
                "clearnet": session.totals().clearnet,
                "hidden": session.totals().hidden,
                "total": session.totals().total,
                "demo": load.notice.is_demo(),
                "bins": bins,
                "hiddenNodes": hidden,
            });
            serde_json::to_writer_pretty(&mut out, &doc).map_err(io::Error::other)?;
            writeln!(out)?;
        }
        Commands::View { print, time } => {
            if print {
                let (width, height) = crossterm::terminal::size().unwrap_or((100, 45));
                view::snapshot(&session, width, height).print_to(&mut out)?;
            } else {
                drop(out);
                view::run(&mut session, time)?;
            }
        }
    }

    Ok(())
}
