use crate::{constants::Weight, graph::Node};

/// Haversine straight-line distance between two nodes, expressed as a
/// lower-bound travel weight in deci-seconds (an admissible A* heuristic at
/// a generous 110 km/h).
pub fn straight_line(src: &Node, dst: &Node) -> Weight {
    let lat1 = src.lat.to_radians();
    let lat2 = dst.lat.to_radians();
    let lon1 = src.lon.to_radians();
    let lon2 = dst.lon.to_radians();
    let a = (lat2 - lat1) / 2.0;
    let b = (lon2 - lon1) / 2.0;
    let c = a.sin().powi(2) + lat1.cos() * lat2.cos() * b.sin().powi(2);
    let d = 2.0 * c.sqrt().asin();
    let km = 6371.0 * d;
    let deci_seconds = km / 110.0 * 3600.0 * 10.0;
    deci_seconds.round() as Weight
}

/// Great-circle bearing from `src` to `dst`, in degrees, normalized to
/// `[0, 360)` (0 = due north, 90 = due east). Used by edge-based expansion
/// (`spec.md` §4.4 step 4) to turn a triple of coordinates into a turn
/// angle a profile's `turn_function` can score.
pub fn bearing(src: &Node, dst: &Node) -> f64 {
    let lat1 = src.lat.to_radians();
    let lat2 = dst.lat.to_radians();
    let delta_lon = (dst.lon - src.lon).to_radians();
    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    let deg = y.atan2(x).to_degrees();
    (deg + 360.0) % 360.0
}

/// Turn angle for the triple `(from, via, to)`, in degrees, following the
/// original's convention: `180` means "straight ahead", `0`/`360` means a
/// full U-turn, and `90`/`270` are right-angle turns. Computed from the
/// incoming bearing (reversed, since it points back the way we came) and
/// the outgoing bearing.
pub fn turn_angle(from: &Node, via: &Node, to: &Node) -> f64 {
    let incoming = bearing(from, via);
    let outgoing = bearing(via, to);
    (outgoing - incoming + 180.0).rem_euclid(360.0)
}
