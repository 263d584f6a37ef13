//! Color saturation.

use serde::{Deserialize, Serialize};

/// Saturation of a light, from 0 (white) to 254 (most saturated).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Saturation {
    pub(crate) value: u8,
}

impl Default for Saturation {
    fn default() -> Self {
        Self::new()
    }
}

impl Saturation {
    const MAX: u8 = 254;

    /// Create a fully saturated value.
    pub fn new() -> Self {
        Saturation { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns `None` if value exceeds 254.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::Saturation;
    ///
    /// assert!(Saturation::create(0).is_some());
    /// assert!(Saturation::create(254).is_some());
    /// assert!(Saturation::create(255).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Saturation { value })
        } else {
            None
        }
    }
}
