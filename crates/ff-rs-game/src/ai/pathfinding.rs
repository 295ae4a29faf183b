//! Straight-line movement on the XY plane (no obstacles).

/// Distance between two points in the XY plane, truncated to whole units.
pub fn distance_xy(x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    let dx = f64::from(x2) - f64::from(x1);
    let dy = f64::from(y2) - f64::from(y1);
    dx.hypot(dy) as i32
}

/// Distance between two points in 3D, truncated to whole units.
pub fn distance_xyz(a: (i32, i32, i32), b: (i32, i32, i32)) -> i32 {
    let dx = f64::from(b.0) - f64::from(a.0);
    let dy = f64::from(b.1) - f64::from(a.1);
    let dz = f64::from(b.2) - f64::from(a.2);
    dx.hypot(dy).hypot(dz) as i32
}

/// Next waypoint when walking from `(x1, y1)` toward `(x2, y2)` at `speed`
/// units per step.
///
/// The remaining path is split into `distance / speed + 1` equal legs and one
/// leg is taken, so a target within `speed` is reached exactly.
pub fn lerp(x1: i32, y1: i32, x2: i32, y2: i32, speed: i32) -> (i32, i32) {
    let distance = distance_xy(x1, y1, x2, y2);
    let legs = distance / speed.max(1);
    let frac = 1.0 / (f64::from(legs) + 1.0);
    let step = |a: i32, b: i32| a + ((f64::from(b) - f64::from(a)) * frac).round() as i32;
    (step(x1, x2), step(y1, y2))
}
