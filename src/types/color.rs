//! RGB colors as accepted by the color helpers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parse a hex color code: `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::Color;
    ///
    /// assert_eq!(Color::hex("#FF8000").unwrap(), Color::rgb(255, 128, 0));
    /// assert_eq!(Color::hex("0f0").unwrap(), Color::rgb(0, 255, 0));
    /// assert!(Color::hex("#12345").is_err());
    /// ```
    pub fn hex(code: &str) -> Result<Self, Error> {
        let digits = code.trim().trim_start_matches('#');
        let unsupported = || Error::UnsupportedColor(code.to_string());

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(unsupported());
        }

        match digits.len() {
            6 => {
                let channel = |i: usize| {
                    u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| unsupported())
                };
                Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            3 => {
                // #rgb expands each digit, so "f" becomes "ff"
                let channel = |i: usize| {
                    u8::from_str_radix(&digits[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| unsupported())
                };
                Ok(Self::rgb(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => Err(unsupported()),
        }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Convert to HSV: hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
    pub fn to_hsv(&self) -> (f64, f64, f64) {
        let r = self.red as f64 / 255.0;
        let g = self.green as f64 / 255.0;
        let b = self.blue as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        let saturation = if max == 0.0 { 0.0 } else { delta / max };

        (hue.rem_euclid(360.0), saturation, max)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse from a hex code (`#ff8000`) or a comma-separated triple (`255,128,0`).
    fn from_str(s: &str) -> Result<Self, Error> {
        if !s.contains(',') {
            return Self::hex(s);
        }

        let parts = s
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| Error::UnsupportedColor(s.to_string()))?;
        match parts[..] {
            [red, green, blue] => Ok(Self::rgb(red, green, blue)),
            _ => Err(Error::UnsupportedColor(s.to_string())),
        }
    }
}
