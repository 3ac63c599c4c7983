// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// Color type for overlay drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Red color. Fixed alert color for failing verdicts.
    pub const RED: Color = Color(255, 0, 0);
    /// Green color. Default good-posture color.
    pub const GREEN: Color = Color(0, 255, 0);
    /// Blue color.
    pub const BLUE: Color = Color(0, 0, 255);
    /// Yellow color.
    pub const YELLOW: Color = Color(255, 255, 0);
    /// Cyan color.
    pub const CYAN: Color = Color(0, 255, 255);
    /// Magenta color.
    pub const MAGENTA: Color = Color(255, 0, 255);
    /// White color.
    pub const WHITE: Color = Color(255, 255, 255);
    /// Black color.
    pub const BLACK: Color = Color(0, 0, 0);

    /// Create a new color from RGB values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Parse a color name or `#rrggbb` hex string.
    ///
    /// Used to read the good-posture display color from external settings.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => return Some(Self::RED),
            "green" => return Some(Self::GREEN),
            "blue" => return Some(Self::BLUE),
            "yellow" => return Some(Self::YELLOW),
            "cyan" => return Some(Self::CYAN),
            "magenta" => return Some(Self::MAGENTA),
            "white" => return Some(Self::WHITE),
            "black" => return Some(Self::BLACK),
            _ => {}
        }

        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self(r, g, b))
    }

    /// Convert to an `image` crate RGB pixel.
    #[must_use]
    pub const fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.0, self.1, self.2])
    }
}
