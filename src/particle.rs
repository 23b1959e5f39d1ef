//! Wave function particles.
//!
//! Every particle owns a [`Body`] (kinematics plus the spawn pop-in). The two kinds differ in
//! what else they carry: anchors hold a label and a link, mobile particles hold the collapse
//! and growth animations and can be merged.

use crate::color::{FALLBACK_ANCHOR_COLOR, WAVE_COLOR};
use crate::geometry::{clamp_lenient, combined_area_radius, ease_out_back, ease_out_quad};
use crate::placement::{self, PlacementStrategy};
use crate::settings::{AnimationTimings, SimulationSettings};
use crate::surface::Bounds;
use glam::DVec2;
use log::debug;
use rand::Rng;
use ratatui::style::Color;
use std::ops::Range;
use std::time::Duration;

/// Opacity of a fully spawned, non-collapsing particle
pub const MAX_ALPHA: f64 = 0.7;

/// Radius of every anchor
pub const ANCHOR_RADIUS: f64 = 50.0;

/// Radius range for newly spawned mobile particles
pub const MOBILE_RADIUS: Range<f64> = 20.0..50.0;

/// Smallest drift speed per axis, so nothing spawns motionless
const MIN_DRIFT: f64 = 0.05;

/// Velocities are expressed per reference frame at this rate
const REFERENCE_FPS: f64 = 60.0;

pub type ParticleId = u64;

/// Fraction of `duration` elapsed since `started`, clamped to `[0, 1]`
fn progress(now: Duration, started: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    (now.saturating_sub(started).as_secs_f64() / duration.as_secs_f64()).min(1.0)
}

/// Kinematic state plus the spawn animation
#[derive(Debug, Clone)]
pub struct Body {
    pub position: DVec2,
    /// Units per reference frame at 60 fps
    pub velocity: DVec2,
    pub radius: f64,
    /// Always equal to `radius` (unit-density disk)
    pub mass: f64,
    pub alpha: f64,
    spawn_progress: f64,
    spawn_started: Duration,
    timings: AnimationTimings,
}

impl Body {
    pub fn new(
        position: DVec2,
        velocity: DVec2,
        radius: f64,
        now: Duration,
        timings: AnimationTimings,
    ) -> Self {
        Self {
            position,
            velocity,
            radius,
            mass: radius,
            alpha: 0.0,
            spawn_progress: 0.0,
            spawn_started: now,
            timings,
        }
    }

    /// Spawn animation progress in percent
    pub fn spawn_progress(&self) -> f64 {
        self.spawn_progress
    }

    pub fn is_spawning(&self) -> bool {
        self.spawn_progress < 100.0
    }

    /// Radius used for drawing and hit-testing; small while spawning
    pub fn visible_radius(&self) -> f64 {
        self.radius * self.spawn_progress / 100.0
    }

    /// Pointer hit test against the spawn-scaled radius (the rim counts as inside).
    /// A body that has not started popping in cannot be hit.
    pub fn contains_point(&self, point: DVec2) -> bool {
        let radius = self.visible_radius();
        radius > 0.0 && point.distance(self.position) <= radius
    }

    /// Strict overlap: exact tangency does not count
    pub fn overlaps(&self, other: &Body) -> bool {
        self.position.distance(other.position) < self.radius + other.radius
    }

    #[cfg(test)]
    pub fn finish_spawn(&mut self) {
        self.spawn_progress = 100.0;
        self.alpha = MAX_ALPHA;
    }

    /// Advance the pop-in
    fn advance_spawn(&mut self, now: Duration) {
        if !self.is_spawning() {
            return;
        }
        let t = progress(now, self.spawn_started, self.timings.spawn);
        self.spawn_progress = (ease_out_back(t) * 100.0).clamp(0.0, 100.0);
    }

    /// Alpha driven by the spawn animation
    fn apply_spawn_alpha(&mut self) {
        self.alpha = MAX_ALPHA * self.spawn_progress / 100.0;
    }

    fn integrate(&mut self, dt: f64, bounds: Bounds, margin: f64) {
        self.position += self.velocity * dt * REFERENCE_FPS;
        self.bounce_off_walls(bounds, margin);
        self.clamp_inside(bounds, margin);
    }

    /// Reflect off any wall the disk touches. The sign is forced rather than negated,
    /// so a body pushed past a wall always heads back in.
    fn bounce_off_walls(&mut self, bounds: Bounds, margin: f64) {
        let r = self.radius;

        if self.position.x + r >= bounds.width - margin {
            self.position.x = bounds.width - r - margin;
            self.velocity.x = -self.velocity.x.abs();
        } else if self.position.x - r <= margin {
            self.position.x = r + margin;
            self.velocity.x = self.velocity.x.abs();
        }

        if self.position.y + r >= bounds.height - margin {
            self.position.y = bounds.height - r - margin;
            self.velocity.y = -self.velocity.y.abs();
        } else if self.position.y - r <= margin {
            self.position.y = r + margin;
            self.velocity.y = self.velocity.y.abs();
        }
    }

    fn clamp_inside(&mut self, bounds: Bounds, margin: f64) {
        let r = self.radius + margin;
        self.position.x = clamp_lenient(self.position.x, r, bounds.width - r);
        self.position.y = clamp_lenient(self.position.y, r, bounds.height - r);
    }
}

/// A labeled link particle. Never merges, never collapses.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub body: Body,
    pub label: String,
    pub url: String,
    pub color: Color,
}

impl Anchor {
    fn advance(&mut self, dt: f64, now: Duration, bounds: Bounds, margin: f64) {
        self.body.advance_spawn(now);
        self.body.apply_spawn_alpha();
        self.body.integrate(dt, bounds, margin);
    }

    /// Label lines (labels may contain one line break)
    pub fn label_lines(&self) -> Vec<&str> {
        self.label.lines().take(2).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Growth {
    from: f64,
    to: f64,
    started: Duration,
}

/// A free-floating wave function: can collapse, grow and merge
#[derive(Debug, Clone)]
pub struct Mobile {
    pub body: Body,
    collapse_started: Option<Duration>,
    growth: Option<Growth>,
    marked_for_removal: bool,
}

impl Mobile {
    pub fn new(body: Body) -> Self {
        Self {
            body,
            collapse_started: None,
            growth: None,
            marked_for_removal: false,
        }
    }

    pub fn is_collapsing(&self) -> bool {
        self.collapse_started.is_some()
    }

    #[cfg(test)]
    pub fn is_growing(&self) -> bool {
        self.growth.is_some()
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    #[cfg(test)]
    /// Target radius of a running growth animation
    pub fn growth_target(&self) -> Option<f64> {
        self.growth.map(|g| g.to)
    }

    /// Start the fade-out. Calling again while already collapsing keeps the original timer.
    pub fn collapse(&mut self, now: Duration) {
        if self.collapse_started.is_none() {
            self.collapse_started = Some(now);
        }
    }

    /// Terminal: the driver drops this particle at the next filter step
    pub fn mark_for_removal(&mut self) {
        self.marked_for_removal = true;
    }

    /// Grow from the current radius to `target`, concurrently with motion
    pub fn start_growth(&mut self, target: f64, now: Duration) {
        self.growth = Some(Growth {
            from: self.body.radius,
            to: target,
            started: now,
        });
    }

    fn advance(&mut self, dt: f64, now: Duration, bounds: Bounds, margin: f64) {
        self.body.advance_spawn(now);

        match self.collapse_started {
            Some(started) => {
                let t = now.saturating_sub(started).as_secs_f64()
                    / self.body.timings.collapse.as_secs_f64().max(f64::MIN_POSITIVE);
                // fades from whatever the pop-in had reached
                let spawned = self.body.spawn_progress / 100.0;
                self.body.alpha = (MAX_ALPHA * (1.0 - t)).max(0.0) * spawned;
                if t >= 1.0 {
                    self.marked_for_removal = true;
                }
            }
            None => {
                self.body.apply_spawn_alpha();
                self.body.integrate(dt, bounds, margin);
            }
        }

        self.advance_growth(now);
    }

    fn advance_growth(&mut self, now: Duration) {
        let Some(growth) = self.growth else {
            return;
        };
        let t = progress(now, growth.started, self.body.timings.growth);
        if t >= 1.0 {
            self.body.radius = growth.to;
            self.growth = None;
        } else {
            self.body.radius = growth.from + (growth.to - growth.from) * ease_out_quad(t);
        }
        self.body.mass = self.body.radius;
    }
}

/// Which side of a merge survived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSurvivor {
    First,
    Second,
}

/// Merge two mobile particles. The heavier one (ties go to `second`, the comparison is a
/// strict `>` on `first`) grows to the area-preserving radius and takes the averaged
/// velocity; the other collapses and is removed at the next filter step.
pub fn combine(first: &mut Mobile, second: &mut Mobile, now: Duration) -> MergeSurvivor {
    let new_radius = combined_area_radius(first.body.radius, second.body.radius);
    let new_velocity = (first.body.velocity + second.body.velocity) / 2.0;

    let (winner, loser, survivor) = if first.body.mass > second.body.mass {
        (first, second, MergeSurvivor::First)
    } else {
        (second, first, MergeSurvivor::Second)
    };

    winner.start_growth(new_radius, now);
    winner.body.velocity = new_velocity;
    loser.collapse(now);
    loser.mark_for_removal();

    survivor
}

#[derive(Debug, Clone)]
pub enum ParticleKind {
    Anchor(Anchor),
    Mobile(Mobile),
}

/// Everything construction needs to know about the world
pub struct SpawnContext<'a> {
    pub bounds: Bounds,
    pub existing: &'a [Particle],
    pub now: Duration,
    pub settings: &'a SimulationSettings,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub id: ParticleId,
    pub kind: ParticleKind,
}

impl Particle {
    /// New mobile particle with a random radius, placed away from existing ones
    pub fn spawn_mobile<R: Rng>(id: ParticleId, rng: &mut R, ctx: &SpawnContext) -> Self {
        let radius = rng.gen_range(MOBILE_RADIUS);
        let (position, radius) = place(rng, ctx, radius, PlacementStrategy::Uniform);
        let velocity = initial_velocity(rng, 2.0);
        let body = Body::new(position, velocity, radius, ctx.now, ctx.settings.timings());
        Self {
            id,
            kind: ParticleKind::Mobile(Mobile::new(body)),
        }
    }

    /// New anchor placed on a ring around the surface center
    pub fn spawn_anchor<R: Rng>(
        id: ParticleId,
        rng: &mut R,
        ctx: &SpawnContext,
        label: impl Into<String>,
        url: impl Into<String>,
        color: Option<Color>,
    ) -> Self {
        let (position, radius) = place(rng, ctx, ANCHOR_RADIUS, PlacementStrategy::Ring);
        let velocity = initial_velocity(rng, 1.0);
        let body = Body::new(position, velocity, radius, ctx.now, ctx.settings.timings());
        Self {
            id,
            kind: ParticleKind::Anchor(Anchor {
                body,
                label: label.into(),
                url: url.into(),
                color: color.unwrap_or(FALLBACK_ANCHOR_COLOR),
            }),
        }
    }

    #[cfg(test)]
    /// Mobile particle at an exact spot (still has to spawn in)
    pub fn mobile_at(
        id: ParticleId,
        position: DVec2,
        velocity: DVec2,
        radius: f64,
        now: Duration,
        timings: AnimationTimings,
    ) -> Self {
        Self {
            id,
            kind: ParticleKind::Mobile(Mobile::new(Body::new(
                position, velocity, radius, now, timings,
            ))),
        }
    }

    pub fn body(&self) -> &Body {
        match &self.kind {
            ParticleKind::Anchor(a) => &a.body,
            ParticleKind::Mobile(m) => &m.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match &mut self.kind {
            ParticleKind::Anchor(a) => &mut a.body,
            ParticleKind::Mobile(m) => &mut m.body,
        }
    }

    pub fn is_anchor(&self) -> bool {
        matches!(self.kind, ParticleKind::Anchor(_))
    }

    pub fn as_mobile(&self) -> Option<&Mobile> {
        match &self.kind {
            ParticleKind::Mobile(m) => Some(m),
            ParticleKind::Anchor(_) => None,
        }
    }

    pub fn as_mobile_mut(&mut self) -> Option<&mut Mobile> {
        match &mut self.kind {
            ParticleKind::Mobile(m) => Some(m),
            ParticleKind::Anchor(_) => None,
        }
    }

    pub fn is_collapsing(&self) -> bool {
        self.as_mobile().is_some_and(Mobile::is_collapsing)
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.as_mobile().is_some_and(Mobile::is_marked_for_removal)
    }

    pub fn color(&self) -> Color {
        match &self.kind {
            ParticleKind::Anchor(a) => a.color,
            ParticleKind::Mobile(_) => WAVE_COLOR,
        }
    }

    /// One simulation step: spawn pop-in, then collapse fade or motion, then growth
    pub fn advance(&mut self, dt: f64, now: Duration, bounds: Bounds, margin: f64) {
        match &mut self.kind {
            ParticleKind::Anchor(a) => a.advance(dt, now, bounds, margin),
            ParticleKind::Mobile(m) => m.advance(dt, now, bounds, margin),
        }
    }
}

/// Bounded shrink-and-retry placement. Each failed level shrinks the radius to
/// `initial / (level + 1)`; when every level fails the last radius is placed unchecked.
fn place<R: Rng>(
    rng: &mut R,
    ctx: &SpawnContext,
    initial_radius: f64,
    strategy: PlacementStrategy,
) -> (DVec2, f64) {
    let mut radius = initial_radius;
    for level in 1..=ctx.settings.shrink_retries {
        if let Some(position) = placement::find_valid_position(
            rng,
            ctx.bounds,
            radius,
            strategy,
            ctx.existing,
            ctx.settings.placement_attempts,
        ) {
            return (position, radius);
        }
        radius = initial_radius / (level as f64 + 1.0);
    }
    debug!(
        "placement exhausted for radius {:.1}, falling back to radius {:.1} unchecked",
        initial_radius, radius
    );
    (placement::unchecked_position(rng, ctx.bounds, radius), radius)
}

/// Diagonal drift with a guaranteed minimum speed
fn initial_velocity<R: Rng>(rng: &mut R, multiplier: f64) -> DVec2 {
    let base = (rng.gen::<f64>() - 0.5) * 0.5;
    let speed = if base.abs() >= MIN_DRIFT {
        base
    } else {
        MIN_DRIFT.copysign(base)
    };
    DVec2::splat(speed * multiplier)
}
