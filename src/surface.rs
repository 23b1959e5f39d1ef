use glam::DVec2;
use ratatui::style::Color;

/// Logical size of the drawing surface. The simulation re-reads this every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// A surface with no drawable area cannot host the simulation
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Drawing operations the simulation needs from its host
pub trait RenderSurface {
    /// Current logical size
    fn bounds(&self) -> Bounds;

    /// Wipe the whole surface
    fn clear(&mut self);

    /// Fill a disk. `alpha` is in `[0, MAX_ALPHA]`.
    fn draw_circle(&mut self, center: DVec2, radius: f64, color: Color, alpha: f64);

    /// Draw centered text, one entry per line
    fn draw_text(&mut self, center: DVec2, lines: &[&str], color: Color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_helpers() {
        let b = Bounds::new(800.0, 400.0);
        assert_eq!(b.center(), DVec2::new(400.0, 200.0));
        assert!(!b.is_empty());
        assert!(Bounds::new(0.0, 10.0).is_empty());
        assert!(Bounds::new(f64::NAN, 10.0).is_empty());
    }
}
