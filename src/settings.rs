use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lengths of the three timed animations a particle can run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTimings {
    pub spawn: Duration,
    pub collapse: Duration,
    pub growth: Duration,
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self {
            spawn: Duration::from_millis(500),
            collapse: Duration::from_millis(500),
            growth: Duration::from_millis(500),
        }
    }
}

/// All simulation settings consolidated into one struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    // === Population ===
    /// Population cap; at the cap every non-anchor contact merges (10-500)
    pub max_particles: usize,
    /// Period of the top-up timer in milliseconds (250-10000)
    pub spawn_interval_ms: u64,

    // === Interaction ===
    /// Chance that a non-anchor contact merges below the cap (0.0-1.0)
    pub merge_probability: f64,
    /// Ticks between de-clustering sweeps (1-120)
    pub declutter_interval: u64,
    /// Magnitude of the random velocity nudge applied while de-clustering (0.0-2.0)
    pub declutter_nudge: f64,
    /// Extra distance added to every overlap separation (0.0-2.0)
    pub separation_buffer: f64,
    /// Gap kept between a particle and each wall
    pub wall_margin: f64,

    // === Timing ===
    pub spawn_duration_ms: u64,
    pub collapse_duration_ms: u64,
    pub growth_duration_ms: u64,
    /// Fixed tick rate in Hz
    pub tick_rate: f64,
    /// Integration step is capped at this many fixed steps
    pub max_dt_factor: f64,

    // === Placement ===
    /// Random candidates tried per placement search
    pub placement_attempts: usize,
    /// Number of shrink levels tried before falling back to an unchecked spot
    pub shrink_retries: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            max_particles: 100,
            spawn_interval_ms: 2000,

            merge_probability: 0.05,
            declutter_interval: 10,
            declutter_nudge: 0.5,
            separation_buffer: 0.1,
            wall_margin: 1.0,

            spawn_duration_ms: 500,
            collapse_duration_ms: 500,
            growth_duration_ms: 500,
            tick_rate: 60.0,
            max_dt_factor: 2.0,

            placement_attempts: 100,
            shrink_retries: 5,
        }
    }
}

impl SimulationSettings {
    pub fn timings(&self) -> AnimationTimings {
        AnimationTimings {
            spawn: Duration::from_millis(self.spawn_duration_ms),
            collapse: Duration::from_millis(self.collapse_duration_ms),
            growth: Duration::from_millis(self.growth_duration_ms),
        }
    }

    /// Minimum wall-clock gap between two ticks
    pub fn fixed_step(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1.0))
    }

    /// Largest dt fed into integration
    pub fn max_dt(&self) -> Duration {
        self.fixed_step().mul_f64(self.max_dt_factor.max(1.0))
    }

    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    /// Adjust population cap within bounds
    pub fn adjust_max_particles(&mut self, delta: i32) {
        self.max_particles = (self.max_particles as i32 + delta).clamp(10, 500) as usize;
    }

    /// Adjust spawn interval within bounds
    pub fn adjust_spawn_interval(&mut self, delta: i64) {
        self.spawn_interval_ms = (self.spawn_interval_ms as i64 + delta).clamp(250, 10_000) as u64;
    }

    /// Adjust merge probability within bounds
    pub fn adjust_merge_probability(&mut self, delta: f64) {
        self.merge_probability = (self.merge_probability + delta).clamp(0.0, 1.0);
    }

    /// Adjust de-cluster interval within bounds
    pub fn adjust_declutter_interval(&mut self, delta: i64) {
        self.declutter_interval = (self.declutter_interval as i64 + delta).clamp(1, 120) as u64;
    }

    /// Adjust de-cluster nudge within bounds
    pub fn adjust_declutter_nudge(&mut self, delta: f64) {
        self.declutter_nudge = (self.declutter_nudge + delta).clamp(0.0, 2.0);
    }

    /// Adjust separation buffer within bounds
    pub fn adjust_separation_buffer(&mut self, delta: f64) {
        self.separation_buffer = (self.separation_buffer + delta).clamp(0.0, 2.0);
    }

    /// Clamp every field into its documented range (used after loading a config file)
    pub fn sanitize(&mut self) {
        self.max_particles = self.max_particles.clamp(10, 500);
        self.spawn_interval_ms = self.spawn_interval_ms.clamp(250, 10_000);
        self.merge_probability = self.merge_probability.clamp(0.0, 1.0);
        self.declutter_interval = self.declutter_interval.clamp(1, 120);
        self.declutter_nudge = self.declutter_nudge.clamp(0.0, 2.0);
        self.separation_buffer = self.separation_buffer.clamp(0.0, 2.0);
        self.wall_margin = self.wall_margin.max(0.0);
        self.tick_rate = self.tick_rate.clamp(1.0, 240.0);
        self.max_dt_factor = self.max_dt_factor.clamp(1.0, 10.0);
        self.placement_attempts = self.placement_attempts.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_tuning() {
        let s = SimulationSettings::default();
        assert_eq!(s.max_particles, 100);
        assert_eq!(s.spawn_interval(), Duration::from_secs(2));
        assert_eq!(s.merge_probability, 0.05);
        assert_eq!(s.declutter_interval, 10);
        assert_eq!(s.timings(), AnimationTimings::default());
    }

    #[test]
    fn test_fixed_step_and_cap() {
        let s = SimulationSettings::default();
        let step = s.fixed_step().as_secs_f64();
        assert!((step - 1.0 / 60.0).abs() < 1e-9);
        assert!((s.max_dt().as_secs_f64() - 2.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_clamps() {
        let mut s = SimulationSettings::default();
        s.adjust_merge_probability(5.0);
        assert_eq!(s.merge_probability, 1.0);
        s.adjust_merge_probability(-5.0);
        assert_eq!(s.merge_probability, 0.0);

        s.adjust_max_particles(-1000);
        assert_eq!(s.max_particles, 10);
        s.adjust_declutter_interval(1000);
        assert_eq!(s.declutter_interval, 120);
        s.adjust_spawn_interval(-100_000);
        assert_eq!(s.spawn_interval_ms, 250);
    }

    #[test]
    fn test_sanitize() {
        let mut s = SimulationSettings {
            merge_probability: 3.0,
            tick_rate: 0.0,
            placement_attempts: 0,
            ..Default::default()
        };
        s.sanitize();
        assert_eq!(s.merge_probability, 1.0);
        assert_eq!(s.tick_rate, 1.0);
        assert_eq!(s.placement_attempts, 1);
    }
}
