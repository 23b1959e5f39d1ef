use crate::color::fade;
use crate::particle::MAX_ALPHA;
use crate::surface::{Bounds, RenderSurface};
use glam::DVec2;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

const DOTS_X: usize = 2;
const DOTS_Y: usize = 4;

/// A single rendered Braille cell with position and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// One row of label text, already clipped to the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub color: Color,
}

/// Terminal drawing surface: a grid of Braille cells where each dot covers
/// `units_per_dot` logical units on both axes.
#[derive(Debug, Clone)]
pub struct BrailleCanvas {
    cols: u16,
    rows: u16,
    units_per_dot: f64,
    dots: Vec<bool>,
    /// Color of the most recently painted dot in each cell
    cell_colors: Vec<Option<Color>>,
    text: Vec<TextRow>,
}

impl BrailleCanvas {
    pub fn new(cols: u16, rows: u16, units_per_dot: f64) -> Self {
        let mut canvas = Self {
            cols: 0,
            rows: 0,
            units_per_dot: units_per_dot.max(f64::EPSILON),
            dots: Vec::new(),
            cell_colors: Vec::new(),
            text: Vec::new(),
        };
        canvas.resize(cols, rows);
        canvas
    }

    /// Change the cell grid; contents are discarded
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let cells = cols as usize * rows as usize;
        self.dots = vec![false; cells * DOTS_X * DOTS_Y];
        self.cell_colors = vec![None; cells];
        self.text.clear();
    }

    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn units_per_dot(&self) -> f64 {
        self.units_per_dot
    }

    fn dot_width(&self) -> usize {
        self.cols as usize * DOTS_X
    }

    fn dot_height(&self) -> usize {
        self.rows as usize * DOTS_Y
    }

    /// Logical point at the center of a character cell (pointer mapping)
    pub fn cell_to_surface(&self, col: u16, row: u16) -> DVec2 {
        DVec2::new(
            (col as f64 * DOTS_X as f64 + DOTS_X as f64 / 2.0) * self.units_per_dot,
            (row as f64 * DOTS_Y as f64 + DOTS_Y as f64 / 2.0) * self.units_per_dot,
        )
    }

    fn set_dot(&mut self, dx: usize, dy: usize, color: Color) {
        let width = self.dot_width();
        self.dots[dy * width + dx] = true;
        let cell = (dy / DOTS_Y) * self.cols as usize + dx / DOTS_X;
        self.cell_colors[cell] = Some(color);
    }

    /// Label rows drawn since the last clear
    pub fn text_rows(&self) -> &[TextRow] {
        &self.text
    }

    /// Collapse the dot buffer into Braille characters; empty cells are skipped
    pub fn to_cells(&self) -> Vec<BrailleCell> {
        let width = self.dot_width();
        let mut cells = Vec::new();

        for cy in 0..self.rows {
            for cx in 0..self.cols {
                let mut pattern: u8 = 0;
                let base_x = cx as usize * DOTS_X;
                let base_y = cy as usize * DOTS_Y;

                for (dx, column) in BRAILLE_DOTS.iter().enumerate() {
                    for (dy, bit) in column.iter().enumerate() {
                        if self.dots[(base_y + dy) * width + base_x + dx] {
                            pattern |= bit;
                        }
                    }
                }

                if pattern != 0 {
                    let index = cy as usize * self.cols as usize + cx as usize;
                    cells.push(BrailleCell {
                        x: cx,
                        y: cy,
                        char: char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' '),
                        color: self.cell_colors[index].unwrap_or(Color::White),
                    });
                }
            }
        }

        cells
    }
}

impl RenderSurface for BrailleCanvas {
    fn bounds(&self) -> Bounds {
        Bounds::new(
            self.dot_width() as f64 * self.units_per_dot,
            self.dot_height() as f64 * self.units_per_dot,
        )
    }

    fn clear(&mut self) {
        self.dots.fill(false);
        self.cell_colors.fill(None);
        self.text.clear();
    }

    fn draw_circle(&mut self, center: DVec2, radius: f64, color: Color, alpha: f64) {
        if alpha <= 0.0 || radius <= 0.0 || !center.is_finite() {
            return;
        }
        let (width, height) = (self.dot_width(), self.dot_height());
        if width == 0 || height == 0 {
            return;
        }

        let color = fade(color, alpha, MAX_ALPHA);
        let c = center / self.units_per_dot;
        let r = radius / self.units_per_dot;

        // Below one dot: light the dot under the center
        if r < 0.5 {
            if c.x >= 0.0 && c.y >= 0.0 && (c.x as usize) < width && (c.y as usize) < height {
                self.set_dot(c.x as usize, c.y as usize, color);
            }
            return;
        }

        let x0 = (c.x - r).floor().max(0.0) as usize;
        let y0 = (c.y - r).floor().max(0.0) as usize;
        let x1 = ((c.x + r).ceil().max(0.0) as usize).min(width);
        let y1 = ((c.y + r).ceil().max(0.0) as usize).min(height);
        let r2 = r * r;

        for dy in y0..y1 {
            for dx in x0..x1 {
                let dot_center = DVec2::new(dx as f64 + 0.5, dy as f64 + 0.5);
                if dot_center.distance_squared(c) <= r2 {
                    self.set_dot(dx, dy, color);
                }
            }
        }
    }

    fn draw_text(&mut self, center: DVec2, lines: &[&str], color: Color) {
        if lines.is_empty() || self.cols == 0 || self.rows == 0 || !center.is_finite() {
            return;
        }
        let col = (center.x / self.units_per_dot / DOTS_X as f64).floor() as i64;
        let row = (center.y / self.units_per_dot / DOTS_Y as f64).floor() as i64;
        let first_row = row - lines.len() as i64 / 2;

        for (i, line) in lines.iter().enumerate() {
            let y = first_row + i as i64;
            if y < 0 || y >= self.rows as i64 {
                continue;
            }
            let len = line.chars().count() as i64;
            let start = col - len / 2;
            let skip = (-start).max(0) as usize;
            let x = start.max(0);
            if x >= self.cols as i64 {
                continue;
            }
            let room = (self.cols as i64 - x) as usize;
            let text: String = line.chars().skip(skip).take(room).collect();
            if text.is_empty() {
                continue;
            }
            self.text.push(TextRow {
                x: x as u16,
                y: y as u16,
                text,
                color,
            });
        }
    }
}
