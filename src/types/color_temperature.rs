//! Color temperature control.

use serde::{Deserialize, Serialize};

/// Color temperature in mireds, with valid values from 153 (6500K) to 500 (2000K).
///
/// Lower values produce cooler (more blue) light, while higher values produce
/// warmer (more yellow/orange) light. Typical values:
/// - 370: Warm white (2700K)
/// - 250: Neutral white (4000K)
/// - 153: Daylight (6500K)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ColorTemperature {
    pub(crate) mired: u16,
}

impl Default for ColorTemperature {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorTemperature {
    const MIN: u16 = 153;
    const MAX: u16 = 500;

    /// Create a new ColorTemperature with the warmest value (500 mired).
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::ColorTemperature;
    ///
    /// assert_eq!(ColorTemperature::new().mired(), 500);
    /// ```
    pub fn new() -> Self {
        ColorTemperature { mired: Self::MAX }
    }

    pub fn mired(&self) -> u16 {
        self.mired
    }

    /// The temperature in Kelvin, rounded.
    pub fn kelvin(&self) -> u32 {
        (1_000_000.0 / self.mired as f64).round() as u32
    }

    /// Returns `None` if value is outside the valid range (153-500).
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::ColorTemperature;
    ///
    /// assert!(ColorTemperature::create(152).is_none());
    /// assert!(ColorTemperature::create(153).is_some());
    /// assert!(ColorTemperature::create(500).is_some());
    /// assert!(ColorTemperature::create(501).is_none());
    /// ```
    pub fn create(mired: u16) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&mired) {
            Some(ColorTemperature { mired })
        } else {
            None
        }
    }

    /// Convert from Kelvin, clamping to what the bridge accepts.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::ColorTemperature;
    ///
    /// assert_eq!(ColorTemperature::from_kelvin(2700).mired(), 370);
    /// assert_eq!(ColorTemperature::from_kelvin(10000).mired(), 153);
    /// assert_eq!(ColorTemperature::from_kelvin(0).mired(), 500);
    /// ```
    pub fn from_kelvin(kelvin: u32) -> Self {
        if kelvin == 0 {
            return Self::new();
        }
        let mired = (1_000_000.0 / kelvin as f64).round();
        ColorTemperature {
            mired: mired.clamp(Self::MIN as f64, Self::MAX as f64) as u16,
        }
    }
}
