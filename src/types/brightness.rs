//! Brightness levels as understood by the bridge.

use serde::{Deserialize, Serialize};

/// Brightness from 1 (the minimum the light is capable of) to 254 (the maximum).
///
/// A brightness of 1 is not off; use [`crate::PowerMode`] for that.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new()
    }
}

impl Brightness {
    const MIN: u8 = 1;
    const MAX: u8 = 254;

    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside valid range (1-254).
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::Brightness;
    ///
    /// assert!(Brightness::create(0).is_none());
    /// assert!(Brightness::create(1).is_some());
    /// assert!(Brightness::create(254).is_some());
    /// assert!(Brightness::create(255).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if Self::is_valid(value) {
            Some(Brightness { value })
        } else {
            None
        }
    }

    /// Returns default (254) if value is invalid.
    pub fn create_or(value: u8) -> Self {
        Self::create(value).unwrap_or_default()
    }

    /// Scale a percentage (clamped to 0-100) onto the bridge range.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::Brightness;
    ///
    /// assert_eq!(Brightness::from_percent(100).value(), 254);
    /// assert_eq!(Brightness::from_percent(50).value(), 127);
    /// assert_eq!(Brightness::from_percent(0).value(), 1);
    /// ```
    pub fn from_percent(percent: u8) -> Self {
        let scaled = (percent.min(100) as f64 / 100.0 * Self::MAX as f64).round() as u8;
        Brightness {
            value: scaled.max(Self::MIN),
        }
    }

    fn is_valid(value: u8) -> bool {
        (Self::MIN..=Self::MAX).contains(&value)
    }
}
