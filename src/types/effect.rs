//! Dynamic effects, alerts and group types.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The dynamic effect of a light.
///
/// `Colorloop` cycles through all hues using the current brightness and
/// saturation settings. Other values are rejected by the bridge with error type 7.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Effect {
    None,
    Colorloop,
}

/// A temporary change to a light's state.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Alert {
    /// Stop any ongoing breathe cycle
    None,
    /// One breathe cycle
    Select,
    /// Breathe cycles for 15 seconds
    Lselect,
}

/// Kind of a bridge group.
///
/// If not provided upon creation `LightGroup` is used.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, EnumIter, EnumString, Display)]
pub enum GroupType {
    LightGroup,
    Room,
    Luminaire,
    LightSource,
    Entertainment,
    Zone,
    #[serde(other)]
    Other,
}
