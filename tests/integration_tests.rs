mod common;

use common::{init_logging, names, scattered, sorted_names, spiral, station, stations};
use geogrid::{
    Cell, IndexBuilder, LabeledPoint, Locatable, ManualClock, PointIndex, distance_between,
};
use std::sync::Arc;
use std::time::Duration;

fn london(resolution: f64) -> PointIndex<LabeledPoint> {
    let mut index = PointIndex::new(resolution);
    stations().into_iter().for_each(|p| index.add(p));
    index
}

#[test]
fn test_placement_roundtrip() {
    init_logging();
    let mut index = london(500.0);

    for p in stations() {
        assert_eq!(index.get(p.id()).as_ref(), Some(&p));
    }
    assert_eq!(index.len(), stations().len());
}

#[test]
fn test_range_returns_stations_in_rectangle() {
    let mut index = london(1000.0);

    let within = index.range(&station("Oxford Circus"), &station("Embankment"));
    assert_eq!(
        sorted_names(&within),
        [
            "Charing Cross",
            "Covent Garden",
            "Embankment",
            "Leicester Square",
            "Oxford Circus",
            "Piccadilly Circus",
        ]
    );
}

#[test]
fn test_range_matches_brute_force_at_any_resolution() {
    let points = scattered(400, 7);
    let top_left = LabeledPoint::at(51.56, -0.22);
    let bottom_right = LabeledPoint::at(51.47, -0.05);

    let mut expected: Vec<String> = points
        .iter()
        .filter(|p| {
            p.lat() >= bottom_right.lat()
                && p.lat() <= top_left.lat()
                && p.lon() >= top_left.lon()
                && p.lon() <= bottom_right.lon()
        })
        .map(|p| p.to_string())
        .collect();
    expected.sort();
    assert!(!expected.is_empty());

    for resolution in [50.0, 333.0, 1000.0, 5000.0] {
        let mut index = PointIndex::new(resolution);
        points.iter().cloned().for_each(|p| index.add(p));

        let found = index.range(&top_left, &bottom_right);
        assert_eq!(sorted_names(&found), expected, "resolution {resolution}");
    }
}

#[test]
fn test_range_of_empty_region() {
    let mut index = london(500.0);
    let found = index.range(&LabeledPoint::at(10.0, 10.0), &LabeledPoint::at(9.0, 11.0));
    assert!(found.is_empty());
}

#[test]
fn test_k_nearest_three_stations() {
    let mut index = london(500.0);
    let found = index.k_nearest(&station("Charing Cross"), 3, 1000.0, |_| true);
    assert_eq!(names(&found), ["Charing Cross", "Embankment", "Leicester Square"]);
}

#[test]
fn test_k_nearest_with_predicate() {
    let mut index = london(500.0);
    let charing = station("Charing Cross");

    let all = index.k_nearest(&charing, 5, 20_000.0, |_| true);
    assert_eq!(
        names(&all),
        ["Charing Cross", "Embankment", "Leicester Square", "Covent Garden", "Piccadilly Circus"]
    );

    let no_piccadilly = index.k_nearest(&charing, 5, 20_000.0, |p| !p.id().contains("Piccadilly"));
    assert_eq!(
        names(&no_piccadilly),
        ["Charing Cross", "Embankment", "Leicester Square", "Covent Garden", "Westminster"]
    );

    // Queries leave the index untouched.
    assert_eq!(index.k_nearest(&charing, 5, 20_000.0, |_| true), all);
}

#[test]
fn test_k_nearest_bounded_by_distance() {
    let mut index = london(500.0);
    let found = index.k_nearest(&station("Charing Cross"), 100, 1000.0, |_| true);
    assert_eq!(found.len(), 8);
}

#[test]
fn test_k_nearest_three_point_scenario() {
    let mut index = PointIndex::new(500.0);
    let charing = station("Charing Cross");
    index.add(station("Waterloo"));
    index.add(station("Oxford Circus"));
    index.add(charing.clone());

    let waterloo = distance_between(&charing, &station("Waterloo"));
    let oxford = distance_between(&charing, &station("Oxford Circus"));
    let closer = if waterloo < oxford { "Waterloo" } else { "Oxford Circus" };

    let found = index.k_nearest(&charing, 2, 2000.0, |_| true);
    assert_eq!(names(&found), ["Charing Cross", closer]);
}

#[test]
fn test_k_nearest_matches_brute_force() {
    let center = LabeledPoint::new("center", 51.5, -0.12);
    let points = spiral(&center, 60, 60.0);
    let max_distance = 3000.0;

    let mut index = PointIndex::new(250.0);
    points.iter().cloned().for_each(|p| index.add(p));

    let mut expected: Vec<(f64, String)> = points
        .iter()
        .map(|p| (distance_between(&center, p), p.to_string()))
        .filter(|(d, _)| *d <= max_distance)
        .collect();
    expected.sort_by(|a, b| a.0.total_cmp(&b.0));
    let expected: Vec<String> = expected.into_iter().map(|(_, id)| id).collect();

    let found = index.k_nearest(&center, points.len(), max_distance, |_| true);
    assert_eq!(names(&found), expected);

    let distances: Vec<f64> = found.iter().map(|p| distance_between(&center, p)).collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert!(distances.iter().all(|d| *d <= max_distance));
}

#[test]
fn test_k_nearest_respects_k() {
    let center = LabeledPoint::new("center", 51.5, -0.12);
    let mut index = PointIndex::new(250.0);
    spiral(&center, 60, 60.0).into_iter().for_each(|p| index.add(p));

    for k in [1, 4, 10] {
        let found = index.k_nearest(&center, k, 3000.0, |_| true);
        assert_eq!(found.len(), k);
        assert_eq!(found[0].id(), "s0");
    }
}

#[test]
fn test_move_updates_cell() {
    let mut index = london(500.0);
    let before = station("Waterloo");
    let after = before.moved_to(51.52, -0.10);
    assert_ne!(Cell::of(&before, 500.0), Cell::of(&after, 500.0));

    index.add(after.clone());

    assert_eq!(index.get("Waterloo"), Some(after.clone()));
    assert_eq!(index.len(), stations().len());
    let old_area = index.range(&LabeledPoint::at(51.5030, -0.1148), &LabeledPoint::at(51.5029, -0.1146));
    assert!(old_area.is_empty());
    let new_area = index.range(&LabeledPoint::at(51.5201, -0.1001), &LabeledPoint::at(51.5199, -0.0999));
    assert_eq!(names(&new_area), ["Waterloo"]);
}

#[test]
fn test_expiring_index() {
    init_logging();
    let clock = Arc::new(ManualClock::new());
    let mut index: PointIndex<LabeledPoint> = IndexBuilder::new()
        .resolution(1000.0)
        .ttl(Duration::from_millis(5000))
        .clock(clock.clone())
        .build()
        .unwrap();

    index.add(station("Piccadilly Circus"));
    clock.advance(Duration::from_secs(1));
    index.add(station("Charing Cross"));
    clock.advance(Duration::from_secs(1));
    index.add(station("Embankment"));
    clock.advance(Duration::from_secs(1));
    index.add(station("Covent Garden"));
    clock.advance(Duration::from_secs(1));
    index.add(station("Leicester Square"));

    let oxford = station("Oxford Circus");
    let embankment = station("Embankment");
    let charing = station("Charing Cross");

    assert_eq!(
        sorted_names(&index.range(&oxford, &embankment)),
        ["Charing Cross", "Covent Garden", "Embankment", "Leicester Square", "Piccadilly Circus"]
    );
    assert_eq!(
        names(&index.k_nearest(&charing, 3, 5000.0, |_| true)),
        ["Charing Cross", "Embankment", "Leicester Square"]
    );
    assert!(index.get("Piccadilly Circus").is_some());
    assert!(index.get("Charing Cross").is_some());

    clock.advance(Duration::from_millis(2500));

    assert!(index.get("Piccadilly Circus").is_none());
    assert!(index.get("Charing Cross").is_none());
    assert!(index.get("Embankment").is_some());
    assert!(index.get("Covent Garden").is_some());
    assert!(index.get("Leicester Square").is_some());

    assert_eq!(
        sorted_names(&index.range(&oxford, &embankment)),
        ["Covent Garden", "Embankment", "Leicester Square"]
    );
    assert_eq!(
        sorted_names(&index.k_nearest(&charing, 3, 5000.0, |_| true)),
        ["Covent Garden", "Embankment", "Leicester Square"]
    );
    assert_eq!(index.len(), 3);
}

#[test]
fn test_ttl_refresh_on_readd() {
    let clock = Arc::new(ManualClock::new());
    let mut index = PointIndex::with_expiration_and_clock(500.0, Duration::from_secs(10), clock.clone());
    let bus = LabeledPoint::new("bus", 51.5, -0.12);

    index.add(bus.clone());
    clock.advance(Duration::from_secs(8));
    index.add(bus.clone());
    clock.advance(Duration::from_secs(8));

    // 16 s after the first insert, 8 s after the refresh.
    assert_eq!(index.get("bus"), Some(bus.clone()));

    clock.advance(Duration::from_secs(3));
    assert_eq!(index.get("bus"), None);
}

#[test]
fn test_ttl_refresh_after_move() {
    let clock = Arc::new(ManualClock::new());
    let mut index = PointIndex::with_expiration_and_clock(500.0, Duration::from_secs(10), clock.clone());

    index.add(LabeledPoint::new("bus", 51.50, -0.12));
    clock.advance(Duration::from_secs(8));
    index.add(LabeledPoint::new("bus", 51.52, -0.10));
    clock.advance(Duration::from_secs(8));

    assert_eq!(index.get("bus").map(|p| p.lat()), Some(51.52));
    assert_eq!(index.expire_all(), 0);
    assert_eq!(index.len(), 1);
}

#[test]
fn test_expire_all_then_snapshot() {
    let clock = Arc::new(ManualClock::new());
    let mut index = PointIndex::with_expiration_and_clock(500.0, Duration::from_secs(5), clock.clone());
    stations().into_iter().for_each(|p| index.add(p));
    clock.advance(Duration::from_secs(6));

    assert_eq!(index.all().len(), stations().len());
    assert_eq!(index.expire_all(), stations().len());
    assert!(index.all().is_empty());
    assert!(index.is_empty());
}

#[test]
fn test_clone_does_not_share_buckets() {
    let mut original = london(500.0);
    let mut copy = original.clone();

    copy.remove("Charing Cross");
    copy.add(station("Embankment").moved_to(51.6, -0.2));

    assert!(original.get("Charing Cross").is_some());
    assert_eq!(original.get("Embankment"), Some(station("Embankment")));
    assert_eq!(
        names(&original.k_nearest(&station("Charing Cross"), 3, 1000.0, |_| true)),
        ["Charing Cross", "Embankment", "Leicester Square"]
    );
    assert_eq!(copy.len(), original.len() - 1);
}
