use crate::geometry::{decompose, elastic_1d, recompose, unit_normal, NormalTangent};
use crate::particle::{combine, Body, Particle, ParticleKind};
use glam::DVec2;
use log::trace;
use rand::Rng;
use std::time::Duration;

/// Knobs the per-tick pass needs from the settings
#[derive(Debug, Clone, Copy)]
pub struct InteractionParams {
    pub merge_probability: f64,
    pub max_particles: usize,
    pub separation_buffer: f64,
}

/// What one pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub collisions: usize,
    pub merges: usize,
}

/// Two distinct mutable elements of a slice
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert!(i < j, "pair_mut expects i < j");
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Elastic collision along the contact normal, followed by overlap separation.
/// Returns false (and changes nothing) for coincident centers.
pub fn resolve_collision(a: &mut Body, b: &mut Body, separation_buffer: f64) -> bool {
    let Some((normal, distance)) = unit_normal(a.position, b.position) else {
        return false;
    };

    let va = decompose(a.velocity, normal);
    let vb = decompose(b.velocity, normal);
    let (na, nb) = elastic_1d(va.normal, a.mass, vb.normal, b.mass);

    a.velocity = recompose(
        NormalTangent {
            normal: na,
            tangent: va.tangent,
        },
        normal,
    );
    b.velocity = recompose(
        NormalTangent {
            normal: nb,
            tangent: vb.tangent,
        },
        normal,
    );

    separate_along(a, b, normal, distance, separation_buffer);
    true
}

/// Push two bodies apart along `normal` (pointing a -> b), half the overlap each
fn separate_along(a: &mut Body, b: &mut Body, normal: DVec2, distance: f64, buffer: f64) {
    let overlap = a.radius + b.radius - distance;
    if overlap > 0.0 {
        let push = normal * (overlap + buffer) / 2.0;
        a.position -= push;
        b.position += push;
    }
}

/// One full pairwise pass: detect contacts, then merge or bounce.
///
/// Pairs involving a particle already marked for removal are skipped, so a merge loser
/// takes no further part in this tick.
pub fn interaction_pass<R: Rng>(
    particles: &mut [Particle],
    params: InteractionParams,
    rng: &mut R,
    now: Duration,
) -> PassStats {
    let population = particles.len();
    let mut stats = PassStats::default();

    for i in 0..population {
        for j in (i + 1)..population {
            let (a, b) = pair_mut(particles, i, j);
            if a.is_marked_for_removal() || b.is_marked_for_removal() {
                continue;
            }
            if !a.body().overlaps(b.body()) {
                continue;
            }

            let both_mobile = !a.is_anchor() && !b.is_anchor();
            let merge = both_mobile
                && (population >= params.max_particles
                    || rng.gen::<f64>() < params.merge_probability);

            if merge {
                if let (ParticleKind::Mobile(first), ParticleKind::Mobile(second)) =
                    (&mut a.kind, &mut b.kind)
                {
                    let survivor = combine(first, second, now);
                    trace!("merge {} + {} -> {:?}", a.id, b.id, survivor);
                    stats.merges += 1;
                }
            } else if resolve_collision(a.body_mut(), b.body_mut(), params.separation_buffer) {
                stats.collisions += 1;
            }
        }
    }

    stats
}

/// Separation-only sweep that breaks up stuck clusters: every overlapping pair is pushed
/// apart (coincident pairs along a random direction) and each mobile member gets a small
/// random velocity kick of up to `nudge / 2` per axis. Returns the number of pairs touched.
pub fn declutter<R: Rng>(particles: &mut [Particle], nudge: f64, rng: &mut R) -> usize {
    let population = particles.len();
    let mut separated = 0;

    for i in 0..population {
        for j in (i + 1)..population {
            let (a, b) = pair_mut(particles, i, j);
            if a.is_marked_for_removal() || b.is_marked_for_removal() {
                continue;
            }

            let (pa, pb) = (a.body().position, b.body().position);
            let distance = pa.distance(pb);
            let overlap = a.body().radius + b.body().radius - distance;
            if overlap <= 0.0 {
                continue;
            }

            let normal = match unit_normal(pa, pb) {
                Some((normal, _)) => normal,
                None => {
                    let angle = rng.gen::<f64>() * std::f64::consts::TAU;
                    DVec2::new(angle.cos(), angle.sin())
                }
            };
            let push = normal * overlap / 2.0;
            a.body_mut().position -= push;
            b.body_mut().position += push;

            for p in [a, b] {
                if !p.is_anchor() {
                    let kick = DVec2::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5) * nudge;
                    p.body_mut().velocity += kick;
                }
            }
            separated += 1;
        }
    }

    separated
}
