//! Hex color strings as stored in settings.
//!
//! Settings keep colors as user-editable strings; rendering resolves them
//! through [`Color::resolve_or`], so a bad string never reaches the host as an
//! error, only as the fallback color.

use std::fmt;
use std::str::FromStr;

use crate::error::StatusError;

/// An opaque-or-translucent ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const TRANSPARENT: Color = Color::argb(0x00, 0x00, 0x00, 0x00);
    pub const LIME_GREEN: Color = Color::rgb(0x32, 0xCD, 0x32);
    pub const GOLDENROD: Color = Color::rgb(0xDA, 0xA5, 0x20);
    pub const ORANGE_RED: Color = Color::rgb(0xFF, 0x45, 0x00);
    pub const SLATE_GRAY: Color = Color::rgb(0x70, 0x80, 0x90);
    pub const DIM_GRAY: Color = Color::rgb(0x69, 0x69, 0x69);

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(0xFF, r, g, b)
    }

    /// Parses `#AARRGGBB`, `#RRGGBB`, `#ARGB` or `#RGB`.
    ///
    /// Surrounding whitespace is ignored and hex digits are case-insensitive.
    /// Forms without an alpha channel are fully opaque.
    pub fn parse(input: &str) -> Result<Color, StatusError> {
        let invalid = || StatusError::InvalidColorFormat(input.to_string());

        let digits = input.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let nibbles: Vec<u8> = digits.bytes().map(hex_value).collect();
        let channels: [u8; 4] = match *nibbles.as_slice() {
            [r, g, b] => [0xFF, r * 17, g * 17, b * 17],
            [a, r, g, b] => [a * 17, r * 17, g * 17, b * 17],
            [r1, r0, g1, g0, b1, b0] => [0xFF, (r1 << 4) | r0, (g1 << 4) | g0, (b1 << 4) | b0],
            [a1, a0, r1, r0, g1, g0, b1, b0] => {
                [(a1 << 4) | a0, (r1 << 4) | r0, (g1 << 4) | g0, (b1 << 4) | b0]
            }
            _ => return Err(invalid()),
        };

        let [a, r, g, b] = channels;
        Ok(Color { a, r, g, b })
    }

    /// Formats as `#AARRGGBB` with uppercase hex digits.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }

    /// Parses `input`, or returns `fallback` when it is empty or malformed.
    pub fn resolve_or(input: Option<&str>, fallback: Color) -> Color {
        let Some(raw) = input.filter(|s| !s.trim().is_empty()) else {
            return fallback;
        };
        match Color::parse(raw) {
            Ok(color) => color,
            Err(err) => {
                tracing::debug!(error = %err, fallback = %fallback, "Using fallback color");
                fallback
            }
        }
    }
}

/// Preview color for a settings editor swatch: empty or malformed strings
/// show as transparent.
pub fn swatch(input: &str) -> Color {
    Color::resolve_or(Some(input), Color::TRANSPARENT)
}

fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}
