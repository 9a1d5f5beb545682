//! RGBA colours and colour-string parsing.

use map_common::{MapError, MapResult};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a named colour.
    pub fn parse(s: &str) -> MapResult<Self> {
        let s = s.trim();
        let parsed = if let Some(hex) = s.strip_prefix('#') {
            parse_hex(hex)
        } else {
            named_color(&s.to_lowercase())
        };
        parsed.ok_or_else(|| MapError::invalid_config("cmap", format!("invalid colour '{}'", s)))
    }

    /// Linear interpolation between two colours, `t` in [0, 1].
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let mix = |a: u8, b: u8| -> u8 {
            (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8
        };
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Parse hex colour digits (without the leading '#').
fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Color::rgb(digit(0)?, digit(1)?, digit(2)?))
        }
        6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

/// A subset of the CSS named colours.
fn named_color(name: &str) -> Option<Color> {
    let rgb = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "lime" => (0, 255, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "cyan" | "aqua" => (0, 255, 255),
        "magenta" | "fuchsia" => (255, 0, 255),
        "gray" | "grey" => (128, 128, 128),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "navy" => (0, 0, 128),
        "purple" => (128, 0, 128),
        "teal" => (0, 128, 128),
        "orange" => (255, 165, 0),
        "darkorange" => (255, 140, 0),
        "gold" => (255, 215, 0),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "salmon" => (250, 128, 114),
        "tan" => (210, 180, 140),
        "beige" => (245, 245, 220),
        "indigo" => (75, 0, 130),
        "violet" => (238, 130, 238),
        "darkblue" => (0, 0, 139),
        "lightblue" => (173, 216, 230),
        "skyblue" => (135, 206, 235),
        "steelblue" => (70, 130, 180),
        "darkgreen" => (0, 100, 0),
        "lightgreen" => (144, 238, 144),
        "darkred" => (139, 0, 0),
        "crimson" => (220, 20, 60),
        "coral" => (255, 127, 80),
        "tomato" => (255, 99, 71),
        "khaki" => (240, 230, 140),
        "transparent" => return Some(Color::transparent()),
        _ => return None,
    };
    Some(Color::rgb(rgb.0, rgb.1, rgb.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Color::parse("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::parse("#f80").unwrap(), Color::rgb(255, 136, 0));
        assert_eq!(Color::parse("#ff800080").unwrap(), Color::new(255, 128, 0, 128));
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(Color::parse("Black").unwrap(), Color::rgb(0, 0, 0));
        assert_eq!(Color::parse("grey").unwrap(), Color::parse("gray").unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(Color::parse("#12"), Err(MapError::InvalidConfig { .. })));
        assert!(Color::parse("#gggggg").is_err());
        assert!(Color::parse("blurple").is_err());
    }

    #[test]
    fn test_lerp() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(200, 100, 50);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Color::rgb(100, 50, 25));
    }
}
