use ratatui::style::Color;
use std::str::FromStr;

/// Fill used for every non-anchor particle
pub const WAVE_COLOR: Color = Color::Rgb(100, 100, 255);

/// Fill used when an anchor's manifest color cannot be parsed
pub const FALLBACK_ANCHOR_COLOR: Color = Color::Rgb(255, 255, 255);

/// Parse a manifest color: `#rgb`, `#rrggbb`, `#rrggbbaa` (alpha ignored), `rgb(r, g, b)`,
/// `rgba(r, g, b, a)`, or anything ratatui's own parser accepts (terminal color names such as
/// `red` or `light-blue`, and ANSI indices).
pub fn parse_color(input: &str) -> Option<Color> {
    let s = input.trim();

    if let Some(hex) = s.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        return match hex.len() {
            3 => parse_short_hex(hex),
            8 => Color::from_str(&s[..7]).ok(),
            _ => Color::from_str(s).ok(),
        };
    }

    let lower = s.to_ascii_lowercase();
    if let Some(body) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() < 3 {
            return None;
        }
        let r = parts[0].parse::<u8>().ok()?;
        let g = parts[1].parse::<u8>().ok()?;
        let b = parts[2].parse::<u8>().ok()?;
        return Some(Color::Rgb(r, g, b));
    }

    Color::from_str(s).ok()
}

/// `#rgb`: each digit is doubled
fn parse_short_hex(hex: &str) -> Option<Color> {
    let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
    Some(Color::Rgb(it.next()??, it.next()??, it.next()??))
}

/// Darken a color toward the (black) terminal background.
/// `alpha` is the particle opacity, `max_alpha` the opacity that maps to full brightness.
pub fn fade(color: Color, alpha: f64, max_alpha: f64) -> Color {
    let t = if max_alpha > 0.0 {
        (alpha / max_alpha).clamp(0.0, 1.0)
    } else {
        0.0
    };
    match color {
        Color::Rgb(r, g, b) => {
            let scale = |c: u8| (c as f64 * t).round() as u8;
            Color::Rgb(scale(r), scale(g), scale(b))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_color("#ff8800"), Some(Color::Rgb(255, 136, 0)));
        assert_eq!(parse_color("#F80"), Some(Color::Rgb(255, 136, 0)));
        assert_eq!(parse_color("#12345678"), Some(Color::Rgb(0x12, 0x34, 0x56)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
        assert_eq!(parse_color("#ff88\u{e9}"), None);
    }

    #[test]
    fn test_parse_rgb_functions() {
        assert_eq!(
            parse_color("rgba(100, 100, 255, 1)"),
            Some(Color::Rgb(100, 100, 255))
        );
        assert_eq!(parse_color("rgb(1,2,3)"), Some(Color::Rgb(1, 2, 3)));
        assert_eq!(parse_color("rgb(1,2)"), None);
        assert_eq!(parse_color("rgb(300,2,3)"), None);
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(parse_color(" Red "), Some(Color::Red));
        assert_eq!(parse_color("light-blue"), Some(Color::LightBlue));
        assert_eq!(parse_color("grey"), Some(Color::Gray));
        // CSS-only names are not terminal colors
        assert_eq!(parse_color("orange"), None);
        assert_eq!(parse_color("not-a-color"), None);
    }

    #[test]
    fn test_fade() {
        assert_eq!(fade(Color::Rgb(200, 100, 50), 0.7, 0.7), Color::Rgb(200, 100, 50));
        assert_eq!(fade(Color::Rgb(200, 100, 50), 0.35, 0.7), Color::Rgb(100, 50, 25));
        assert_eq!(fade(Color::Rgb(200, 100, 50), 0.0, 0.7), Color::Rgb(0, 0, 0));
        assert_eq!(fade(Color::White, 0.1, 0.7), Color::White);
    }
}
