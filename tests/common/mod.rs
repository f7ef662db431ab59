#![allow(dead_code)]

use geogrid::LabeledPoint;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn station(name: &str) -> LabeledPoint {
    stations()
        .into_iter()
        .find(|p| p.to_string() == name)
        .unwrap_or_else(|| panic!("unknown station {name}"))
}

/// London stations and a few distant towns.
pub fn stations() -> Vec<LabeledPoint> {
    vec![
        LabeledPoint::new("Waterloo", 51.502973, -0.114723),
        LabeledPoint::new("Kings Cross", 51.529999, -0.124481),
        LabeledPoint::new("Leicester Square", 51.511291, -0.128242),
        LabeledPoint::new("Covent Garden", 51.51276, -0.124507),
        LabeledPoint::new("Tottenham Court Road", 51.516206, -0.13087),
        LabeledPoint::new("Piccadilly Circus", 51.50986, -0.1337),
        LabeledPoint::new("Charing Cross", 51.508359, -0.124803),
        LabeledPoint::new("Embankment", 51.507312, -0.122367),
        LabeledPoint::new("Oxford Circus", 51.51511, -0.1417),
        LabeledPoint::new("Westminster", 51.501402, -0.125002),
        LabeledPoint::new("Regents Park", 51.52347, -0.1468),
        LabeledPoint::new("London Bridge", 51.504674, -0.086006),
        LabeledPoint::new("Brent Cross", 51.576599, -0.213336),
        LabeledPoint::new("Lewisham", 51.46532, -0.0134),
        LabeledPoint::new("Swanley", 51.392994, 0.168716),
        LabeledPoint::new("Watford", 51.65747, -0.41726),
        LabeledPoint::new("Aylesbury", 51.808615, -0.772219),
        LabeledPoint::new("Aylesford", 51.28597, 0.507689),
    ]
}

pub fn names(points: &[LabeledPoint]) -> Vec<String> {
    points.iter().map(|p| p.to_string()).collect()
}

pub fn sorted_names(points: &[LabeledPoint]) -> Vec<String> {
    let mut names = names(points);
    names.sort();
    names
}

/// Deterministic pseudo-random points inside a box around central London.
pub fn scattered(count: usize, seed: u64) -> Vec<LabeledPoint> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..count)
        .map(|i| {
            let lat = 51.40 + next() * 0.25;
            let lon = -0.35 + next() * 0.45;
            LabeledPoint::new(format!("p{i}"), lat, lon)
        })
        .collect()
}

/// Points on a spiral around `center`, the i-th one `step * (i + 1)` meters away.
pub fn spiral(center: &LabeledPoint, count: usize, step: f64) -> Vec<LabeledPoint> {
    use geogrid::Locatable;

    let meters_per_degree = geogrid::EARTH_RADIUS_METERS.to_radians();
    (0..count)
        .map(|i| {
            let distance = step * (i + 1) as f64;
            let bearing = (i as f64 * 137.5).to_radians();
            let lat = center.lat() + distance * bearing.cos() / meters_per_degree;
            let lon = center.lon()
                + distance * bearing.sin() / (meters_per_degree * center.lat().to_radians().cos());
            LabeledPoint::new(format!("s{i}"), lat, lon)
        })
        .collect()
}
