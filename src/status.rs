//! Light and group state as reported by the bridge.

use serde::{Deserialize, Serialize};

use crate::types::{Brightness, ColorTemperature, PowerMode, Saturation};

/// The current state of a light.
#[serde_with::skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct LightState {
    #[serde(default)]
    pub on: bool,
    pub bri: Option<u8>,
    pub hue: Option<u16>,
    pub sat: Option<u8>,
    pub effect: Option<String>,
    pub xy: Option<[f32; 2]>,
    pub ct: Option<u16>,
    pub alert: Option<String>,
    pub colormode: Option<String>,
    pub mode: Option<String>,
    pub reachable: Option<bool>,
}

impl LightState {
    pub fn power(&self) -> PowerMode {
        PowerMode::from(self.on)
    }

    pub fn brightness(&self) -> Option<Brightness> {
        self.bri.and_then(Brightness::create)
    }

    pub fn saturation(&self) -> Option<Saturation> {
        self.sat.and_then(Saturation::create)
    }

    pub fn color_temperature(&self) -> Option<ColorTemperature> {
        self.ct.and_then(ColorTemperature::create)
    }

    /// Lights that never reported reachability are treated as unreachable.
    pub fn is_reachable(&self) -> bool {
        self.reachable.unwrap_or(false)
    }
}

/// The last action applied to a group; mirrors the state of one of its lights.
#[serde_with::skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct GroupAction {
    #[serde(default)]
    pub on: bool,
    pub bri: Option<u8>,
    pub hue: Option<u16>,
    pub sat: Option<u8>,
    pub effect: Option<String>,
    pub xy: Option<[f32; 2]>,
    pub ct: Option<u16>,
    pub alert: Option<String>,
    pub colormode: Option<String>,
}

impl GroupAction {
    pub fn power(&self) -> PowerMode {
        PowerMode::from(self.on)
    }

    pub fn brightness(&self) -> Option<Brightness> {
        self.bri.and_then(Brightness::create)
    }
}

/// Aggregated on/off state of the lights in a group.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct GroupState {
    #[serde(default)]
    pub all_on: bool,
    #[serde(default)]
    pub any_on: bool,
}
