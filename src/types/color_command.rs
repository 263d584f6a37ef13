//! Conversion from RGB to the bridge's hue/saturation/brightness encoding.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Color;
use crate::errors::Error;

/// A color in the bridge's native encoding.
///
/// - `hue`: wrapping value between 0 and 65535. Both 0 and 65535 are red,
///   25500 is green and 46920 is blue on the bridge's color wheel.
/// - `saturation`: 0 (white) to 254 (most saturated).
/// - `brightness`: 0 to 254.
///
/// Always derived from a [`Color`]; never read back from a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCommand {
    pub hue: u16,
    pub saturation: u8,
    pub brightness: u8,
}

impl ColorCommand {
    const HUE_MAX: f64 = 65535.0;
    const LEVEL_MAX: f64 = 254.0;

    /// Build a command from HSV components (hue in degrees, the rest in `[0, 1]`).
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
        ColorCommand {
            hue: (hue.rem_euclid(360.0) / 360.0 * Self::HUE_MAX).round() as u16,
            saturation: (saturation * Self::LEVEL_MAX).round() as u8,
            brightness: (value * Self::LEVEL_MAX).round() as u8,
        }
    }
}

impl From<&Color> for ColorCommand {
    fn from(color: &Color) -> Self {
        let (h, s, v) = color.to_hsv();
        ColorCommand::from_hsv(h, s, v)
    }
}

impl From<Color> for ColorCommand {
    fn from(color: Color) -> Self {
        ColorCommand::from(&color)
    }
}

/// Convert an RGB (`r,g,b`) or hex (`#rrggbb`, `#rgb`) color to the bridge encoding.
///
/// # Examples
///
/// ```
/// use hue_bridge_rs::to_bridge_color;
///
/// let red = to_bridge_color("#FF0000").unwrap();
/// assert_eq!((red.hue, red.saturation, red.brightness), (0, 254, 254));
///
/// assert!(to_bridge_color("not a color").is_err());
/// ```
pub fn to_bridge_color(input: &str) -> Result<ColorCommand, Error> {
    Color::from_str(input).map(ColorCommand::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primaries() {
        let red = to_bridge_color("#FF0000").unwrap();
        assert_eq!(red, ColorCommand { hue: 0, saturation: 254, brightness: 254 });

        let green = to_bridge_color("0,255,0").unwrap();
        assert_eq!(green.hue, 21845);
        assert_eq!(green.saturation, 254);

        let blue = to_bridge_color("#00f").unwrap();
        assert_eq!(blue.hue, 43690);
        assert_eq!(blue.brightness, 254);
    }

    #[test]
    fn test_grey_has_no_saturation() {
        let grey = ColorCommand::from(Color::rgb(128, 128, 128));
        assert_eq!(grey.hue, 0);
        assert_eq!(grey.saturation, 0);
        assert_eq!(grey.brightness, 127);

        let black = ColorCommand::from(Color::rgb(0, 0, 0));
        assert_eq!(black, ColorCommand { hue: 0, saturation: 0, brightness: 0 });
    }

    #[test]
    fn test_levels_stay_in_bridge_range() {
        for r in (0..=255u8).step_by(15) {
            for g in (0..=255u8).step_by(15) {
                for b in (0..=255u8).step_by(15) {
                    let color = Color::rgb(r, g, b);
                    let cmd = ColorCommand::from(color);
                    assert!(cmd.saturation <= 254, "saturation of {r},{g},{b}");
                    assert!(cmd.brightness <= 254, "brightness of {r},{g},{b}");

                    let (h, _, _) = color.to_hsv();
                    let expected = (h.rem_euclid(360.0) / 360.0 * 65535.0).round() as u16;
                    assert_eq!(cmd.hue, expected, "hue of {r},{g},{b}");
                }
            }
        }
    }

    #[test]
    fn test_hue_wraps_near_red() {
        // hue just below 360 degrees lands close to the top of the range
        let cmd = ColorCommand::from(Color::rgb(255, 0, 1));
        assert!(cmd.hue > 65000);
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            to_bridge_color("#GG0000"),
            Err(Error::UnsupportedColor(_))
        ));
    }
}
