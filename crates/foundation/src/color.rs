use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// A validated 6-digit RGB hex color, stored normalized as `#rrggbb` (lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Accepts `rrggbb` or `#rrggbb`, any case.
    pub fn parse(s: &str) -> Result<Self, ConfigurationError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConfigurationError::InvalidColor(s.to_string()));
        }
        Ok(HexColor(format!("#{}", digits.to_ascii_lowercase())))
    }

    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        HexColor(format!("#{r:02x}{g:02x}{b:02x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> [u8; 3] {
        let b = self.0.as_bytes();
        [
            hex_pair(b[1], b[2]),
            hex_pair(b[3], b[4]),
            hex_pair(b[5], b[6]),
        ]
    }

    /// Appends `opacity` as the alpha channel. The opacity must be within `[0, 1]`.
    pub fn with_opacity(&self, opacity: f64) -> Result<Rgba, ConfigurationError> {
        check_opacity(opacity)?;
        let [r, g, b] = self.rgb();
        Ok(Rgba { r, g, b, a: opacity })
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for HexColor {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HexColor::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        HexColor::parse(&s)
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> Self {
        c.0
    }
}

/// 8-bit RGB with a floating-point alpha, as renderers expect `rgba(r, g, b, a)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Color-to-alpha composition from raw strings.
pub fn compose_rgba(hex: &str, opacity: f64) -> Result<Rgba, ConfigurationError> {
    HexColor::parse(hex)?.with_opacity(opacity)
}

pub fn check_opacity(opacity: f64) -> Result<f64, ConfigurationError> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(opacity)
    } else {
        Err(ConfigurationError::InvalidOpacity(opacity))
    }
}

fn hex_pair(hi: u8, lo: u8) -> u8 {
    (hex_digit(hi) << 4) | hex_digit(lo)
}

fn hex_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn composes_rgba_from_hex_and_opacity() {
        let c = compose_rgba("#3388ff", 0.2).expect("valid");
        assert_eq!(
            c,
            Rgba {
                r: 0x33,
                g: 0x88,
                b: 0xff,
                a: 0.2
            }
        );
        assert_eq!(c.to_css(), "rgba(51, 136, 255, 0.2)");
    }

    #[test]
    fn alpha_is_the_input_opacity() {
        for opacity in [0.0, 0.1, 0.333_333_333_333, 0.75, 1.0] {
            let c = compose_rgba("A0B1C2", opacity).expect("valid");
            assert_eq!(c.a, opacity);
            assert_eq!([c.r, c.g, c.b], [0xa0, 0xb1, 0xc2]);
        }
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["", "#fff", "#12345", "#1234567", "#12345g", "zzzzzz", "#ggg000"] {
            assert_eq!(
                HexColor::parse(bad),
                Err(ConfigurationError::InvalidColor(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_opacity() {
        assert_eq!(
            compose_rgba("#000000", 1.5),
            Err(ConfigurationError::InvalidOpacity(1.5))
        );
        assert!(compose_rgba("#000000", f64::NAN).is_err());
    }

    #[test]
    fn from_rgb_formats_lowercase() {
        assert_eq!(HexColor::from_rgb([0xff, 0x0a, 0x00]).as_str(), "#ff0a00");
        assert_eq!(HexColor::from_rgb([1, 2, 3]).rgb(), [1, 2, 3]);
    }

    #[test]
    fn normalizes_case_and_prefix() {
        assert_eq!(HexColor::parse("FFAA00").expect("valid").as_str(), "#ffaa00");
    }
}
