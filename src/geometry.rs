use glam::DVec2;

/// Velocity split into components along and across a contact normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalTangent {
    pub normal: f64,
    pub tangent: f64,
}

/// Unit normal pointing from `from` to `to`, with the distance between them.
/// Returns `None` when the points coincide.
pub fn unit_normal(from: DVec2, to: DVec2) -> Option<(DVec2, f64)> {
    let delta = to - from;
    let distance = delta.length();
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }
    Some((delta / distance, distance))
}

/// Decompose a velocity against a unit normal. The tangent is the normal rotated +90°.
pub fn decompose(velocity: DVec2, normal: DVec2) -> NormalTangent {
    NormalTangent {
        normal: velocity.dot(normal),
        tangent: velocity.dot(normal.perp()),
    }
}

/// Inverse of [`decompose`]
pub fn recompose(parts: NormalTangent, normal: DVec2) -> DVec2 {
    normal * parts.normal + normal.perp() * parts.tangent
}

/// Radius of a disk whose area equals the two disks combined
pub fn combined_area_radius(r1: f64, r2: f64) -> f64 {
    (r1 * r1 + r2 * r2).sqrt()
}

/// 1D elastic collision: returns the post-collision velocities of two bodies
pub fn elastic_1d(v1: f64, m1: f64, v2: f64, m2: f64) -> (f64, f64) {
    let total = m1 + m2;
    (
        (v1 * (m1 - m2) + 2.0 * m2 * v2) / total,
        (v2 * (m2 - m1) + 2.0 * m1 * v1) / total,
    )
}

/// Overshoot-and-settle curve used for the spawn pop-in
pub fn ease_out_back(t: f64) -> f64 {
    const C1: f64 = 1.70158;
    const C3: f64 = C1 + 1.0;
    let u = t - 1.0;
    1.0 + C3 * u.powi(3) + C1 * u.powi(2)
}

pub fn ease_out_quad(t: f64) -> f64 {
    t * (2.0 - t)
}

/// Clamp that tolerates an inverted range (surface smaller than the body):
/// the value lands on the midpoint instead of panicking.
pub fn clamp_lenient(value: f64, lo: f64, hi: f64) -> f64 {
    if lo > hi {
        (lo + hi) / 2.0
    } else {
        value.clamp(lo, hi)
    }
}
