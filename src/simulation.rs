use crate::interaction::{declutter, interaction_pass, InteractionParams};
use crate::manifest::AnchorLink;
use crate::particle::{Particle, ParticleId, ParticleKind, SpawnContext};
use crate::settings::SimulationSettings;
use crate::surface::{Bounds, RenderSurface};
use glam::DVec2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::style::Color;
use std::time::Duration;

/// Anchor labels are drawn once the pop-in is at least this far along
const LABEL_MIN_SPAWN: f64 = 50.0;

/// Running counters for the status panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub ticks: u64,
    pub spawned: u64,
    pub merges: u64,
    pub collisions: u64,
    pub collapses: u64,
    pub removed: u64,
    pub declutter_separations: u64,
}

/// Result of a pointer click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An anchor was hit; the host should open this URL
    Navigate { id: ParticleId, url: String },
    /// A mobile particle started collapsing
    Collapsed(ParticleId),
    /// The hit particle was already fading out
    AlreadyCollapsing(ParticleId),
    Miss,
}

/// Wave function simulation state.
///
/// Owns the population exclusively; the UI mutates it only through the command methods
/// (`click`, `request_collapse`, `request_collapse_all`, `reset`).
///
/// Public methods take wall time since app start. Internally everything runs on a
/// simulation clock that stands still while paused.
pub struct WaveSimulation {
    particles: Vec<Particle>,
    pub settings: SimulationSettings,
    pub stats: SimulationStats,
    bounds: Bounds,
    anchor_links: Vec<AnchorLink>,
    /// Wall time the current pause began
    paused_at: Option<Duration>,
    /// Wall time spent in completed pauses
    paused_for: Duration,
    last_tick: Duration,
    last_spawn: Duration,
    next_id: ParticleId,
    rng: StdRng,
}

impl WaveSimulation {
    pub fn new(bounds: Bounds, settings: SimulationSettings) -> Self {
        Self::with_rng(bounds, settings, StdRng::from_entropy())
    }

    /// Deterministic construction for a fixed seed
    pub fn with_seed(bounds: Bounds, settings: SimulationSettings, seed: u64) -> Self {
        Self::with_rng(bounds, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bounds: Bounds, settings: SimulationSettings, rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            settings,
            stats: SimulationStats::default(),
            bounds,
            anchor_links: Vec::new(),
            paused_at: None,
            paused_for: Duration::ZERO,
            last_tick: Duration::ZERO,
            last_spawn: Duration::ZERO,
            next_id: 0,
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn population(&self) -> usize {
        self.particles.len()
    }

    /// Number of anchors in the manifest that seeded this run
    pub fn anchor_count(&self) -> usize {
        self.anchor_links.len()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Simulation time for a wall-clock instant
    fn clock(&self, now: Duration) -> Duration {
        self.paused_at.unwrap_or(now).saturating_sub(self.paused_for)
    }

    fn next_id(&mut self) -> ParticleId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Seed one anchor per manifest entry. Called once at startup (and on reset).
    pub fn seed_anchors(&mut self, links: &[AnchorLink], now: Duration) {
        let now = self.clock(now);
        self.anchor_links = links.to_vec();
        for link in links {
            let id = self.next_id();
            let ctx = SpawnContext {
                bounds: self.bounds,
                existing: &self.particles,
                now,
                settings: &self.settings,
            };
            let particle = Particle::spawn_anchor(
                id,
                &mut self.rng,
                &ctx,
                link.name.clone(),
                link.link.clone(),
                link.parsed_color(),
            );
            self.particles.push(particle);
        }
        info!("Seeded {} anchors", links.len());
    }

    /// Add one mobile particle
    pub fn spawn_mobile(&mut self, now: Duration) -> ParticleId {
        self.spawn_mobile_at(self.clock(now))
    }

    fn spawn_mobile_at(&mut self, now: Duration) -> ParticleId {
        let id = self.next_id();
        let ctx = SpawnContext {
            bounds: self.bounds,
            existing: &self.particles,
            now,
            settings: &self.settings,
        };
        let particle = Particle::spawn_mobile(id, &mut self.rng, &ctx);
        debug!(
            "spawned {} r={:.1} at ({:.0}, {:.0})",
            id,
            particle.body().radius,
            particle.body().position.x,
            particle.body().position.y
        );
        self.particles.push(particle);
        self.stats.spawned += 1;
        id
    }

    /// Periodic top-up, independent of the tick gate
    fn run_spawn_timer(&mut self, now: Duration) {
        if now.saturating_sub(self.last_spawn) < self.settings.spawn_interval() {
            return;
        }
        self.last_spawn = now;
        if self.particles.len() < self.settings.max_particles {
            self.spawn_mobile_at(now);
        }
    }

    /// Display-refresh callback. Re-reads the surface size, runs the spawn timer and
    /// performs a tick if at least one fixed step has elapsed since the last one.
    /// Late frames are not caught up. Returns true when a tick ran.
    pub fn frame(&mut self, now: Duration, bounds: Bounds) -> bool {
        let now = self.clock(now);
        self.bounds = bounds;
        if self.is_paused() || bounds.is_empty() {
            self.last_tick = now;
            return false;
        }

        self.run_spawn_timer(now);

        let elapsed = now.saturating_sub(self.last_tick);
        if elapsed < self.settings.fixed_step() {
            return false;
        }
        self.last_tick = now;
        self.tick(elapsed.min(self.settings.max_dt()), now);
        true
    }

    /// One physics step: advance every particle, resolve contacts, drop everything
    /// marked for removal, then periodically de-cluster the survivors. `now` is
    /// simulation time.
    pub fn tick(&mut self, dt: Duration, now: Duration) {
        let bounds = self.bounds;
        let margin = self.settings.wall_margin;
        let dt = dt.as_secs_f64();

        for particle in &mut self.particles {
            particle.advance(dt, now, bounds, margin);
        }

        let params = InteractionParams {
            merge_probability: self.settings.merge_probability,
            max_particles: self.settings.max_particles,
            separation_buffer: self.settings.separation_buffer,
        };
        let pass = interaction_pass(&mut self.particles, params, &mut self.rng, now);
        self.stats.merges += pass.merges as u64;
        self.stats.collisions += pass.collisions as u64;
        self.stats.ticks += 1;

        let before = self.particles.len();
        self.particles = std::mem::take(&mut self.particles)
            .into_iter()
            .filter(|p| !p.is_marked_for_removal())
            .collect();
        self.stats.removed += (before - self.particles.len()) as u64;

        if self.stats.ticks % self.settings.declutter_interval.max(1) == 0 {
            let separated = declutter(&mut self.particles, self.settings.declutter_nudge, &mut self.rng);
            self.stats.declutter_separations += separated as u64;
        }
    }

    /// Pointer click in surface coordinates. The first particle (in population order)
    /// whose spawn-scaled disk contains the point is hit. Afterwards a replacement is
    /// spawned if the scene is close to empty.
    pub fn click(&mut self, point: DVec2, now: Duration) -> ClickOutcome {
        let hit = self
            .particles
            .iter()
            .find(|p| !p.is_marked_for_removal() && p.body().contains_point(point));

        let outcome = match hit {
            Some(particle) => match &particle.kind {
                ParticleKind::Anchor(anchor) => ClickOutcome::Navigate {
                    id: particle.id,
                    url: anchor.url.clone(),
                },
                ParticleKind::Mobile(mobile) if mobile.is_collapsing() => {
                    ClickOutcome::AlreadyCollapsing(particle.id)
                }
                ParticleKind::Mobile(_) => ClickOutcome::Collapsed(particle.id),
            },
            None => ClickOutcome::Miss,
        };
        if let ClickOutcome::Collapsed(id) = outcome {
            self.request_collapse(id, now);
        }

        if self.particles.len() <= self.anchor_count() + 1 {
            self.spawn_mobile(now);
        }

        outcome
    }

    /// Collapse one mobile particle by id. Returns false for anchors and unknown ids.
    pub fn request_collapse(&mut self, id: ParticleId, now: Duration) -> bool {
        let now = self.clock(now);
        let Some(mobile) = self
            .particles
            .iter_mut()
            .find(|p| p.id == id)
            .and_then(Particle::as_mobile_mut)
        else {
            return false;
        };
        if !mobile.is_collapsing() {
            mobile.collapse(now);
            self.stats.collapses += 1;
        }
        true
    }

    /// Collapse every mobile particle; anchors are unaffected. Returns how many started.
    pub fn request_collapse_all(&mut self, now: Duration) -> usize {
        let now = self.clock(now);
        let mut started = 0;
        for mobile in self.particles.iter_mut().filter_map(Particle::as_mobile_mut) {
            if !mobile.is_collapsing() {
                mobile.collapse(now);
                started += 1;
            }
        }
        self.stats.collapses += started as u64;
        debug!("collapse all: {} particles", started);
        started
    }

    /// Clear the population and re-seed the anchors
    pub fn reset(&mut self, now: Duration) {
        let links = std::mem::take(&mut self.anchor_links);
        self.particles.clear();
        self.stats = SimulationStats::default();
        self.last_tick = self.clock(now);
        self.last_spawn = self.clock(now);
        self.seed_anchors(&links, now);
    }

    /// Stop or restart the simulation clock at wall time `now`
    pub fn toggle_pause(&mut self, now: Duration) {
        match self.paused_at.take() {
            Some(started) => {
                self.paused_for += now.saturating_sub(started);
                debug!("resumed after {:?}", now.saturating_sub(started));
            }
            None => self.paused_at = Some(now),
        }
    }

    /// Paint the current population: spawn-scaled disks, plus labels on anchors
    pub fn paint<S: RenderSurface>(&self, surface: &mut S) {
        surface.clear();
        for particle in &self.particles {
            let body = particle.body();
            let radius = body.visible_radius();
            if radius <= 0.0 {
                continue;
            }
            surface.draw_circle(body.position, radius, particle.color(), body.alpha);

            if let ParticleKind::Anchor(anchor) = &particle.kind {
                if body.spawn_progress() >= LABEL_MIN_SPAWN {
                    surface.draw_text(body.position, &anchor.label_lines(), Color::White);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::MAX_ALPHA;
    use crate::settings::AnimationTimings;

    const STEP_MS: u64 = 17;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn bounds() -> Bounds {
        Bounds::new(1600.0, 800.0)
    }

    fn sim() -> WaveSimulation {
        WaveSimulation::with_seed(bounds(), SimulationSettings::default(), 42)
    }

    fn links() -> Vec<AnchorLink> {
        vec![
            AnchorLink::new("One", "https://one.example", "#ff0000"),
            AnchorLink::new("Two", "https://two.example", "#00ff00"),
        ]
    }

    /// Run frames at ~60 fps until `until` (inclusive)
    fn run_until(sim: &mut WaveSimulation, from: u64, until: u64) {
        let mut t = from;
        while t <= until {
            sim.frame(ms(t), bounds());
            t += STEP_MS;
        }
    }

    fn push_settled(sim: &mut WaveSimulation, x: f64, y: f64, vx: f64, radius: f64) -> ParticleId {
        let id = sim.next_id();
        let mut p = Particle::mobile_at(
            id,
            DVec2::new(x, y),
            DVec2::new(vx, 0.0),
            radius,
            Duration::ZERO,
            AnimationTimings::default(),
        );
        p.body_mut().finish_spawn();
        sim.particles.push(p);
        id
    }

    struct RecordingSurface {
        circles: Vec<(DVec2, f64, Color, f64)>,
        texts: Vec<Vec<String>>,
        clears: usize,
    }

    impl RenderSurface for RecordingSurface {
        fn bounds(&self) -> Bounds {
            bounds()
        }
        fn clear(&mut self) {
            self.clears += 1;
            self.circles.clear();
            self.texts.clear();
        }
        fn draw_circle(&mut self, center: DVec2, radius: f64, color: Color, alpha: f64) {
            self.circles.push((center, radius, color, alpha));
        }
        fn draw_text(&mut self, _center: DVec2, lines: &[&str], _color: Color) {
            self.texts.push(lines.iter().map(|s| s.to_string()).collect());
        }
    }

    #[test]
    fn test_seed_anchors() {
        let mut sim = sim();
        sim.seed_anchors(&links(), Duration::ZERO);
        assert_eq!(sim.population(), 2);
        assert_eq!(sim.anchor_count(), 2);
        assert!(sim.particles().iter().all(Particle::is_anchor));
        assert_eq!(sim.particles()[0].color(), Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_frame_skips_until_fixed_step() {
        let mut sim = sim();
        assert!(!sim.frame(ms(5), bounds()));
        assert!(!sim.frame(ms(16), bounds()));
        assert!(sim.frame(ms(17), bounds()));
        assert_eq!(sim.stats.ticks, 1);
        // dropped frames are not accumulated
        assert!(!sim.frame(ms(20), bounds()));
        assert!(sim.frame(ms(40), bounds()));
        assert_eq!(sim.stats.ticks, 2);
    }

    #[test]
    fn test_dt_is_capped_after_a_long_gap() {
        let mut sim = WaveSimulation::with_seed(
            bounds(),
            SimulationSettings {
                spawn_interval_ms: 60_000,
                ..Default::default()
            },
            42,
        );
        let id = push_settled(&mut sim, 800.0, 400.0, 1.0, 20.0);
        assert!(sim.frame(ms(10_000), bounds()));
        let p = sim.particles().iter().find(|p| p.id == id).unwrap();
        // two reference frames of motion, not six hundred
        assert!((p.body().position.x - 802.0).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_timer_respects_interval_and_cap() {
        let mut sim = WaveSimulation::with_seed(
            bounds(),
            SimulationSettings {
                merge_probability: 0.0,
                ..Default::default()
            },
            42,
        );
        run_until(&mut sim, 0, 1999);
        assert_eq!(sim.population(), 0);
        run_until(&mut sim, 2000, 2100);
        assert_eq!(sim.population(), 1);
        run_until(&mut sim, 2117, 6100);
        assert_eq!(sim.population(), 3);

        let mut capped = WaveSimulation::with_seed(
            bounds(),
            SimulationSettings {
                max_particles: 10,
                ..Default::default()
            },
            7,
        );
        for _ in 0..10 {
            capped.spawn_mobile(Duration::ZERO);
        }
        capped.frame(ms(2000), bounds());
        assert_eq!(capped.stats.spawned, 10);
    }

    #[test]
    fn test_paused_frames_do_nothing() {
        let mut sim = sim();
        sim.toggle_pause(ms(0));
        assert!(sim.is_paused());
        run_until(&mut sim, 0, 5000);
        assert_eq!(sim.stats.ticks, 0);
        assert_eq!(sim.population(), 0);
        sim.toggle_pause(ms(5001));
        assert!(!sim.is_paused());
        assert!(!sim.frame(ms(5001), bounds()));
        assert!(sim.frame(ms(5018), bounds()));
    }

    #[test]
    fn test_pause_freezes_collapse_and_spawn_timer() {
        let mut sim = sim();
        let id = push_settled(&mut sim, 800.0, 400.0, 0.0, 30.0);
        let alpha_of = |sim: &WaveSimulation| {
            sim.particles()
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.body().alpha)
        };

        assert!(sim.request_collapse(id, ms(20)));
        run_until(&mut sim, 34, 102);
        let before = alpha_of(&sim).unwrap();
        assert!(before > 0.0 && before < MAX_ALPHA);

        sim.toggle_pause(ms(110));
        run_until(&mut sim, 119, 3000);
        assert_eq!(alpha_of(&sim), Some(before));

        sim.toggle_pause(ms(3000));
        assert!(sim.frame(ms(3017), bounds()));
        let after = alpha_of(&sim).expect("still fading after resume");
        assert!(after > 0.0 && after < before);
        assert_eq!(sim.stats.spawned, 0);

        // the fade finishes one collapse duration of running time after it began
        run_until(&mut sim, 3034, 3380);
        assert!(alpha_of(&sim).is_some());
        run_until(&mut sim, 3397, 3500);
        assert!(alpha_of(&sim).is_none());
    }

    #[test]
    fn test_click_while_paused_starts_collapse_on_the_frozen_clock() {
        let mut sim = sim();
        let id = push_settled(&mut sim, 800.0, 400.0, 0.0, 30.0);
        push_settled(&mut sim, 100.0, 100.0, 0.0, 20.0);
        sim.toggle_pause(ms(100));
        assert_eq!(sim.click(DVec2::new(800.0, 400.0), ms(2000)), ClickOutcome::Collapsed(id));
        assert_eq!(sim.stats.collapses, 1);
        sim.toggle_pause(ms(4000));
        run_until(&mut sim, 4017, 4400);
        assert!(sim.particles().iter().any(|p| p.id == id));
        run_until(&mut sim, 4417, 4700);
        assert!(sim.particles().iter().all(|p| p.id != id));
    }

    #[test]
    fn test_empty_surface_never_ticks() {
        let mut sim = sim();
        assert!(!sim.frame(ms(1000), Bounds::new(0.0, 0.0)));
        assert_eq!(sim.stats.ticks, 0);
    }

    #[test]
    fn test_click_hits_scaled_radius() {
        let mut sim = sim();
        sim.seed_anchors(&links(), Duration::ZERO);
        let id = push_settled(&mut sim, 300.0, 300.0, 0.0, 40.0);
        for _ in 0..3 {
            push_settled(&mut sim, 1500.0, 700.0, 0.0, 20.0);
        }

        assert_eq!(sim.click(DVec2::new(320.0, 300.0), ms(10)), ClickOutcome::Collapsed(id));
        assert_eq!(
            sim.click(DVec2::new(320.0, 300.0), ms(20)),
            ClickOutcome::AlreadyCollapsing(id)
        );
        assert_eq!(sim.stats.collapses, 1);
        assert_eq!(sim.click(DVec2::new(341.0, 300.0), ms(30)), ClickOutcome::Miss);
    }

    #[test]
    fn test_click_anchor_navigates_and_never_collapses() {
        let mut sim = sim();
        sim.seed_anchors(&links(), Duration::ZERO);
        run_until(&mut sim, 0, 600);
        let (id, center) = {
            let a = &sim.particles()[0];
            (a.id, a.body().position)
        };
        let outcome = sim.click(center, ms(700));
        assert_eq!(
            outcome,
            ClickOutcome::Navigate {
                id,
                url: "https://one.example".to_string()
            }
        );
        assert!(!sim.particles()[0].is_collapsing());
        assert!(!sim.request_collapse(id, ms(700)));
        sim.request_collapse_all(ms(700));
        assert!(!sim.particles()[0].is_collapsing());
    }

    #[test]
    fn test_click_spawns_replacement_when_nearly_empty() {
        let mut sim = sim();
        sim.seed_anchors(&links(), Duration::ZERO);
        assert_eq!(sim.click(DVec2::new(-500.0, -500.0), ms(1)), ClickOutcome::Miss);
        assert_eq!(sim.population(), 3);
        sim.click(DVec2::new(-500.0, -500.0), ms(2));
        assert_eq!(sim.population(), 4);
        sim.click(DVec2::new(-500.0, -500.0), ms(3));
        assert_eq!(sim.population(), 4);
    }

    #[test]
    fn test_collapsed_particle_is_removed_after_fade() {
        let mut sim = sim();
        let id = push_settled(&mut sim, 800.0, 400.0, 0.0, 30.0);
        assert!(sim.request_collapse(id, ms(100)));
        sim.frame(ms(400), bounds());
        let p = sim.particles().iter().find(|p| p.id == id).unwrap();
        assert!(p.body().alpha > 0.0 && p.body().alpha < MAX_ALPHA);

        sim.frame(ms(600), bounds());
        assert!(sim.particles().iter().all(|p| p.id != id));
        assert_eq!(sim.stats.removed, 1);
    }

    #[test]
    fn test_collapse_all_skips_anchors() {
        let mut sim = sim();
        sim.seed_anchors(&links(), Duration::ZERO);
        push_settled(&mut sim, 100.0, 100.0, 0.0, 20.0);
        push_settled(&mut sim, 1500.0, 100.0, 0.0, 20.0);
        assert_eq!(sim.request_collapse_all(ms(0)), 2);
        assert_eq!(sim.request_collapse_all(ms(10)), 0);
        run_until(&mut sim, 17, 700);
        assert_eq!(sim.population(), 2);
        assert!(sim.particles().iter().all(Particle::is_anchor));
    }

    #[test]
    fn test_merge_loser_is_filtered_in_the_same_tick() {
        let mut sim = WaveSimulation::with_seed(
            bounds(),
            SimulationSettings {
                merge_probability: 1.0,
                ..Default::default()
            },
            3,
        );
        let big = push_settled(&mut sim, 400.0, 400.0, 0.0, 40.0);
        let small = push_settled(&mut sim, 430.0, 400.0, 0.0, 30.0);
        assert!(sim.frame(ms(17), bounds()));
        assert_eq!(sim.population(), 1);
        assert_eq!(sim.particles()[0].id, big);
        assert!(sim.particles().iter().all(|p| p.id != small));
        assert_eq!(sim.stats.merges, 1);

        run_until(&mut sim, 34, 700);
        let body = sim.particles()[0].body();
        assert!((body.radius - 50.0).abs() < 1e-9);
        assert_eq!(body.mass, body.radius);
    }

    #[test]
    fn test_no_marked_particle_survives_a_tick() {
        let mut sim = WaveSimulation::with_seed(
            bounds(),
            SimulationSettings {
                merge_probability: 0.5,
                spawn_interval_ms: 250,
                ..Default::default()
            },
            99,
        );
        sim.seed_anchors(&links(), Duration::ZERO);
        for _ in 0..60 {
            sim.spawn_mobile(Duration::ZERO);
        }
        let mut t = 0;
        while t < 5000 {
            if sim.frame(ms(t), bounds()) {
                assert!(sim.particles().iter().all(|p| !p.is_marked_for_removal()));
                for p in sim.particles() {
                    assert!(p.body().radius > 0.0);
                    assert!(p.body().position.is_finite());
                }
            }
            if t % 500 == 0 {
                let id = sim.particles().last().map(|p| p.id).unwrap_or(0);
                sim.request_collapse(id, ms(t));
            }
            t += STEP_MS;
        }
    }

    #[test]
    fn test_reset_reseeds_anchors() {
        let mut sim = sim();
        sim.seed_anchors(&links(), Duration::ZERO);
        sim.spawn_mobile(Duration::ZERO);
        sim.spawn_mobile(Duration::ZERO);
        sim.reset(ms(1000));
        assert_eq!(sim.population(), 2);
        assert_eq!(sim.anchor_count(), 2);
        assert_eq!(sim.stats, SimulationStats::default());
    }

    #[test]
    fn test_paint_scales_with_spawn_and_labels_anchors() {
        let mut sim = sim();
        sim.seed_anchors(&links(), Duration::ZERO);
        let mut surface = RecordingSurface {
            circles: Vec::new(),
            texts: Vec::new(),
            clears: 0,
        };

        // nothing visible before the first tick
        sim.paint(&mut surface);
        assert!(surface.circles.is_empty());

        run_until(&mut sim, 0, 600);
        sim.paint(&mut surface);
        assert_eq!(surface.clears, 2);
        assert_eq!(surface.circles.len(), 2);
        let (_, radius, color, alpha) = surface.circles[0];
        assert!((radius - sim.particles()[0].body().radius).abs() < 1e-9);
        assert_eq!(color, Color::Rgb(255, 0, 0));
        assert!((alpha - MAX_ALPHA).abs() < 1e-9);
        assert_eq!(surface.texts, vec![vec!["One".to_string()], vec!["Two".to_string()]]);
    }
}
