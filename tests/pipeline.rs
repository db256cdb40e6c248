//! End-to-end: snapshot text in, bins, placements and hit results out

use nodeglobe::config::{InvalidCoordPolicy, PlacementStrategy};
use nodeglobe::globe::polar_to_cartesian;
use nodeglobe::hit_test::PointerEvent;
use nodeglobe::record::CoordSource;
use nodeglobe::session::{Detail, Entity, LoadNotice, Tooltip};
use nodeglobe::source::{FileSource, NoSource, StaticSource};
use nodeglobe::{Session, Settings};
use rand::rngs::StdRng;
use rand::SeedableRng;

const NAMED: &str = r#"{
    "1.2.3.4:8333": {"latitude": 52.52, "longitude": 13.40, "country": "DE", "city": "Berlin", "user_agent": "/Satoshi:27.0.0/"},
    "1.2.3.5:8333": {"latitude": 52.50, "longitude": 13.38, "country": "DE", "city": "Berlin"},
    "1.2.3.6:8333": {"latitude": 999, "longitude": 10, "country": "FR", "city": "Paris"},
    "7.7.7.7:8333": {"latitude": 0, "longitude": 0, "country": "XX"},
    "abc.onion:8333": {"addr_family": "onion"}
}"#;

const POSITIONAL: &str = r#"{
    "5.6.7.8:8333": [70016, "/Satoshi:25.0.0/", 1700000000, "AS3320", 820000, "DE", "Frankfurt", 50.11, 8.68, "Europe/Berlin", "25.0", false],
    "9.8.7.6:8333": [70016, "/Satoshi:26.0.0/", 1700000000, "AS7922", 820000, "US", "Nowhere", null, null, "", "26.0", false],
    "xyz.onion:8333": [70016, "/Satoshi:26.0.0/", 1700000000, null, 820000, null, null, null, null, null, "26.0", true],
    "10.0.0.1:8333": [70016, "/Satoshi:26.0.0/", 1700000000, null, 820000, null, null, null, null, null, "26.0", true]
}"#;

fn rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

#[test]
fn named_snapshot_retains_substituted_coordinates() {
    let mut session = Session::new(&Settings::default());
    let report = session.load_and_process(&StaticSource(NAMED.to_string()), &mut rng());

    assert!(matches!(report.notice, LoadNotice::Live { .. }));
    assert_eq!(report.dropped, 0);
    assert_eq!(report.totals.clearnet, 4);
    assert_eq!(report.totals.hidden, 1);
    assert_eq!(report.totals.total, 5);

    let paris = &session.clearnet()[2];
    assert_eq!(paris.coord_source, CoordSource::CountryCentroid);
    assert!((paris.lat - 46.2276).abs() <= 1.0 + 1e-4);

    // Zero is a valid coordinate
    let null_island = &session.clearnet()[3];
    assert_eq!(null_island.coord_source, CoordSource::Reported);
    assert_eq!((null_island.lat, null_island.lng), (0.0, 0.0));

    assert_eq!(session.layer().total_weight(), 4);
}

#[test]
fn wrong_typed_fields_never_lose_a_record() {
    let text = r#"{
        "2.2.2.2:8333": {"latitude": 51.5, "longitude": -0.12, "country": "GB", "city": 5},
        "def.onion:8333": {"user_agent": 70016},
        "3.3.3.3:8333": {"latitude": 52.52, "longitude": 13.40, "country": "DE", "city": "Berlin"}
    }"#;
    let mut session = Session::new(&Settings::default());
    let report = session.load_and_process(&StaticSource(text.to_string()), &mut rng());

    assert_eq!(report.dropped, 0);
    assert_eq!(report.totals.clearnet, 2);
    assert_eq!(report.totals.hidden, 1);
    assert_eq!(report.totals.total, 3);
    assert_eq!(session.clearnet()[0].country, "GB");
    assert_eq!(session.clearnet()[0].coord_source, CoordSource::Reported);
    assert_eq!(session.hidden()[0].user_agent.as_deref(), Some("70016"));
}

#[test]
fn positional_snapshot_drops_unlocated_clearnet() {
    let mut session = Session::new(&Settings::default());
    let report = session.load_and_process(&StaticSource(POSITIONAL.to_string()), &mut rng());

    assert_eq!(report.dropped, 1);
    assert_eq!(report.totals.clearnet, 1);
    assert_eq!(report.totals.hidden, 2);
    assert_eq!(report.totals.total, 4);

    let node = &session.clearnet()[0];
    assert_eq!(node.version, "25.0");
    assert_eq!(node.asn.as_deref(), Some("AS3320"));
    assert_eq!(node.height, Some(820000));

    match session.click(Entity::Node(0)) {
        Some(Detail::Node { last_seen, city, .. }) => {
            assert_eq!(city, "Frankfurt");
            assert_eq!(last_seen.as_deref(), Some("2023-11-14 22:13 UTC"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn positional_retain_policy_keeps_everything() {
    let mut settings = Settings::default();
    settings.schema.positional_policy = InvalidCoordPolicy::Retain;
    let mut session = Session::new(&settings);
    let report = session.load_and_process(&StaticSource(POSITIONAL.to_string()), &mut rng());
    assert_eq!(report.dropped, 0);
    assert_eq!(report.totals.clearnet, 2);
}

#[test]
fn missing_source_and_missing_file_fall_back_to_demo() {
    let mut session = Session::new(&Settings::default());
    let report = session.load_and_process(&NoSource, &mut rng());
    assert!(report.notice.is_demo());
    assert_eq!(report.totals.clearnet, 720);
    assert!((100..=200).contains(&report.totals.hidden));
    assert_eq!(session.placements().len(), report.totals.hidden);

    let mut session = Session::new(&Settings::default());
    let report = session.load_and_process(&FileSource::new("/nonexistent/snapshot.json"), &mut rng());
    match report.notice {
        LoadNotice::DemoFallback { reason } => assert!(reason.starts_with("Read error")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn demo_filter_and_hover_on_spinning_globe() {
    let mut session = Session::new(&Settings::default());
    session.load_and_process(&NoSource, &mut rng());

    let totals = session.filter("london");
    assert_eq!(totals.clearnet, 200);
    assert_eq!(session.layer().total_weight(), 200);

    session.animation_mut().start();
    for _ in 0..500 {
        session.animation_mut().tick();
    }
    let rotation = session.animation().rotation_y();
    assert!(rotation > 0.9);

    let world = polar_to_cartesian(51.5, -0.12, 100.0).rotate_y(rotation);
    match session.hover(&PointerEvent::Globe { point: world }) {
        Some(Tooltip::Region { country, city, .. }) => {
            assert_eq!(country, "GB");
            assert_eq!(city, "London");
        }
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(session.filter("").clearnet, 720);
    session.teardown();
    assert!(session.layer().is_empty());
}

#[test]
fn shell_placements_float_above_the_globe() {
    let mut settings = Settings::default();
    settings.placement.strategy = PlacementStrategy::Shell;
    let mut session = Session::new(&settings);
    session.load_and_process(&StaticSource(NAMED.to_string()), &mut rng());

    assert_eq!(session.placements().len(), 1);
    let r = session.placements()[0].position.length();
    assert!(r > 120.0 - 1e-9 && r < 150.0 + 1e-9, "radius {}", r);
}

#[test]
fn settings_file_drives_the_session() {
    let settings = Settings::from_toml(
        r#"
        [hexbin]
        radius_deg = 20.0

        [placement]
        strategy = "shell"
        "#,
    );
    let mut session = Session::new(&settings);
    session.load_and_process(&StaticSource(NAMED.to_string()), &mut rng());
    assert_eq!(session.binner().config().radius_deg, 20.0);
    assert!(session.layer().bins.iter().any(|b| b.weight >= 2));
    assert!(session.placements()[0].position.length() >= 120.0 - 1e-9);
}
