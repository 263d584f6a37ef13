//! Value types for light control parameters.

mod brightness;
mod color;
mod color_command;
mod color_temperature;
mod effect;
mod power;
mod saturation;

pub use brightness::Brightness;
pub use color::Color;
pub use color_command::{ColorCommand, to_bridge_color};
pub use color_temperature::ColorTemperature;
pub use effect::{Alert, Effect, GroupType};
pub use power::PowerMode;
pub use saturation::Saturation;
