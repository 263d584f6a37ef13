//! State payload for lights and groups.

use serde::{Deserialize, Serialize};

use crate::types::{
    Alert, Brightness, ColorCommand, ColorTemperature, Effect, PowerMode, Saturation,
};

/// A state change to send to a light (`/lights/<id>/state`) or a group
/// (`/groups/<id>/action`).
///
/// Only the attributes that were set are sent; the bridge answers with one
/// envelope element per attribute.
///
/// # Creating Payloads
///
/// 1. **From a single attribute** using the [`From`] trait:
///    ```
///    use hue_bridge_rs::{PowerMode, StatePayload};
///    let payload = StatePayload::from(&PowerMode::On);
///    ```
///
/// 2. **Builder pattern** for combining multiple attributes:
///    ```
///    use hue_bridge_rs::{Brightness, Effect, StatePayload};
///    let mut payload = StatePayload::new();
///    payload.brightness(&Brightness::create(200).unwrap());
///    payload.effect(&Effect::Colorloop);
///    ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatePayload {
    pub(crate) on: Option<bool>,
    pub(crate) bri: Option<u8>,
    pub(crate) hue: Option<u16>,
    pub(crate) sat: Option<u8>,
    pub(crate) effect: Option<Effect>,
    pub(crate) xy: Option<[f32; 2]>,
    pub(crate) ct: Option<u16>,
    pub(crate) alert: Option<Alert>,
    pub(crate) transitiontime: Option<u16>,
    pub(crate) bri_inc: Option<i16>,
    pub(crate) sat_inc: Option<i16>,
    pub(crate) hue_inc: Option<i32>,
    pub(crate) ct_inc: Option<i32>,
    pub(crate) scene: Option<String>,
}

impl StatePayload {
    /// Create a new empty payload.
    ///
    /// At least one attribute must be set for the payload to be valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::StatePayload;
    ///
    /// let payload = StatePayload::new();
    /// assert_eq!(payload.is_valid(), false);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this payload contains at least one attribute.
    ///
    /// A transition time alone changes nothing and is not valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::{PowerMode, StatePayload};
    ///
    /// let mut payload = StatePayload::new();
    ///
    /// payload.transition_time(4);
    /// assert_eq!(payload.is_valid(), false);
    ///
    /// payload.power(&PowerMode::Off);
    /// assert_eq!(payload.is_valid(), true);
    /// ```
    pub fn is_valid(&self) -> bool {
        self.on.is_some()
            || self.bri.is_some()
            || self.hue.is_some()
            || self.sat.is_some()
            || self.effect.is_some()
            || self.xy.is_some()
            || self.ct.is_some()
            || self.alert.is_some()
            || self.bri_inc.is_some()
            || self.sat_inc.is_some()
            || self.hue_inc.is_some()
            || self.ct_inc.is_some()
            || self.scene.is_some()
    }

    pub fn power(&mut self, power: &PowerMode) -> &mut Self {
        self.on = Some(power.is_on());
        self
    }

    pub fn brightness(&mut self, brightness: &Brightness) -> &mut Self {
        self.bri = Some(brightness.value);
        self
    }

    /// Set the hue, a wrapping value where 0 and 65535 are red.
    pub fn hue(&mut self, hue: u16) -> &mut Self {
        self.hue = Some(hue);
        self
    }

    pub fn saturation(&mut self, saturation: &Saturation) -> &mut Self {
        self.sat = Some(saturation.value);
        self
    }

    /// Set hue, saturation and brightness from a converted color.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::{StatePayload, to_bridge_color};
    ///
    /// let mut payload = StatePayload::new();
    /// payload.color(&to_bridge_color("#00FF00").unwrap());
    /// let json = serde_json::to_value(&payload).unwrap();
    /// assert_eq!(json["hue"], 21845);
    /// assert_eq!(json["sat"], 254);
    /// assert_eq!(json["bri"], 254);
    /// ```
    pub fn color(&mut self, color: &ColorCommand) -> &mut Self {
        self.hue = Some(color.hue);
        self.sat = Some(color.saturation);
        self.bri = Some(color.brightness);
        self
    }

    /// Set the CIE xy color coordinates, each between 0 and 1.
    pub fn xy(&mut self, x: f32, y: f32) -> &mut Self {
        self.xy = Some([x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)]);
        self
    }

    pub fn color_temperature(&mut self, temperature: &ColorTemperature) -> &mut Self {
        self.ct = Some(temperature.mired);
        self
    }

    pub fn effect(&mut self, effect: &Effect) -> &mut Self {
        self.effect = Some(*effect);
        self
    }

    pub fn alert(&mut self, alert: &Alert) -> &mut Self {
        self.alert = Some(*alert);
        self
    }

    /// Transition duration in multiples of 100ms.
    pub fn transition_time(&mut self, deciseconds: u16) -> &mut Self {
        self.transitiontime = Some(deciseconds);
        self
    }

    /// Relative brightness change, -254 to 254.
    pub fn brightness_increment(&mut self, delta: i16) -> &mut Self {
        self.bri_inc = Some(delta.clamp(-254, 254));
        self
    }

    /// Relative saturation change, -254 to 254.
    pub fn saturation_increment(&mut self, delta: i16) -> &mut Self {
        self.sat_inc = Some(delta.clamp(-254, 254));
        self
    }

    /// Relative hue change, -65534 to 65534.
    pub fn hue_increment(&mut self, delta: i32) -> &mut Self {
        self.hue_inc = Some(delta.clamp(-65534, 65534));
        self
    }

    /// Relative color temperature change in mireds, -65534 to 65534.
    pub fn color_temperature_increment(&mut self, delta: i32) -> &mut Self {
        self.ct_inc = Some(delta.clamp(-65534, 65534));
        self
    }

    /// Recall a scene by id. Only meaningful for group actions.
    pub fn scene(&mut self, scene: &str) -> &mut Self {
        self.scene = Some(scene.to_string());
        self
    }
}

impl From<&PowerMode> for StatePayload {
    fn from(power: &PowerMode) -> Self {
        let mut p = StatePayload::new();
        p.power(power);
        p
    }
}

impl From<&Brightness> for StatePayload {
    fn from(brightness: &Brightness) -> Self {
        let mut p = StatePayload::new();
        p.brightness(brightness);
        p
    }
}

impl From<&Saturation> for StatePayload {
    fn from(saturation: &Saturation) -> Self {
        let mut p = StatePayload::new();
        p.saturation(saturation);
        p
    }
}

impl From<&ColorTemperature> for StatePayload {
    fn from(temperature: &ColorTemperature) -> Self {
        let mut p = StatePayload::new();
        p.color_temperature(temperature);
        p
    }
}

/// Turns the light on and applies the color.
impl From<&ColorCommand> for StatePayload {
    fn from(color: &ColorCommand) -> Self {
        let mut p = StatePayload::new();
        p.power(&PowerMode::On).color(color);
        p
    }
}
