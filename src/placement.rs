use crate::particle::Particle;
use crate::surface::Bounds;
use glam::DVec2;
use rand::Rng;

/// Where a new particle is allowed to appear
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementStrategy {
    /// Anywhere the disk fits inside the surface
    Uniform,
    /// On a ring around the surface center (anchors)
    Ring,
}

/// Draw one candidate center for a disk of `radius`
pub fn random_candidate<R: Rng>(
    rng: &mut R,
    bounds: Bounds,
    radius: f64,
    strategy: PlacementStrategy,
) -> DVec2 {
    match strategy {
        PlacementStrategy::Uniform => unchecked_position(rng, bounds, radius),
        PlacementStrategy::Ring => {
            let center = bounds.center();
            let angle = rng.gen::<f64>() * std::f64::consts::TAU;
            let outer = (bounds.width / 4.0 - radius).max(radius);
            let distance = rng.gen::<f64>() * (outer - radius) + radius;
            center + DVec2::new(angle.cos(), angle.sin()) * distance
        }
    }
}

/// Uniform random point such that a disk of `radius` fits (no overlap check)
pub fn unchecked_position<R: Rng>(rng: &mut R, bounds: Bounds, radius: f64) -> DVec2 {
    DVec2::new(
        rng.gen::<f64>() * (bounds.width - 2.0 * radius) + radius,
        rng.gen::<f64>() * (bounds.height - 2.0 * radius) + radius,
    )
}

/// True when a disk at `position` clears every live particle
pub fn is_clear(position: DVec2, radius: f64, existing: &[Particle]) -> bool {
    existing
        .iter()
        .filter(|p| !p.is_marked_for_removal())
        .all(|p| {
            let body = p.body();
            position.distance(body.position) >= radius + body.radius
        })
}

/// Search up to `attempts` random candidates for a non-overlapping spot
pub fn find_valid_position<R: Rng>(
    rng: &mut R,
    bounds: Bounds,
    radius: f64,
    strategy: PlacementStrategy,
    existing: &[Particle],
    attempts: usize,
) -> Option<DVec2> {
    (0..attempts)
        .map(|_| random_candidate(rng, bounds, radius, strategy))
        .find(|&candidate| is_clear(candidate, radius, existing))
}
