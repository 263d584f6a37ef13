//! # hue_bridge_rs
//!
//! An async Rust client for the Philips Hue bridge REST API, on the local
//! network or through the Hue cloud.
//!
//! ## Quick Start
//!
//! ```ignore
//! use hue_bridge_rs::{Bridge, ClientOptions, Color, DeviceType, PairingOptions};
//!
//! async fn control_lights() -> Result<(), hue_bridge_rs::Error> {
//!     // Find the bridge and register with it; press its link button meanwhile
//!     let mut bridge = Bridge::discover(ClientOptions::default()).await?;
//!     let identity = bridge.pair(&PairingOptions::new(DeviceType::generate("my_app"))).await?;
//!     println!("keep this username: {}", identity.identifier);
//!
//!     // Set every light to orange
//!     for light in bridge.lights().get_all().await? {
//!         bridge.lights().set_color(light.id, &Color::rgb(255, 128, 0)).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Discovery**: Find bridges on your network with [`discover_bridges`]
//! - **Pairing**: Get a whitelist username through the link button with [`Bridge::pair`]
//! - **Cloud Access**: Authorize through the Hue cloud with [`Authenticator`]
//! - **Lights**: List, rename, search and control lights through [`Lights`]
//! - **Groups**: Manage rooms and light groups through [`Groups`]
//! - **Colors**: Set any RGB or hex color; it is converted with [`to_bridge_color`]
//! - **State Changes**: Combine attributes and transitions in a [`StatePayload`]
//!
//! ## Errors
//!
//! Nothing is retried internally. A bridge `error` element surfaces as
//! [`Error::BridgeRejected`] with the bridge's type and description, except
//! type 101 which is [`Error::LinkButtonNotPressed`] so callers can press the
//! button and try again.
//!
//! ## Logging
//!
//! Requests and flow steps are reported through the [`log`] facade; install
//! any logger to see them.

mod auth;
mod bridge;
mod config;
mod discovery;
mod errors;
mod group;
mod light;
mod pairing;
mod payload;
mod response;
mod status;
#[cfg(test)]
mod testing;
mod transport;
mod types;

// Re-export public API
pub use auth::{
    AuthPhase, AuthorizationState, Authenticator, RedirectQuery, Token, validate_redirect,
};
pub use bridge::Bridge;
pub use config::{
    API_URL, AUTH_URL, ClientOptions, DISCOVERY_URL, DeviceType, OAuthConfig, PairingOptions,
    TOKEN_URL,
};
pub use discovery::{
    DiscoveredBridge, discover_bridge, discover_bridge_at, discover_bridges, discover_bridges_at,
};
pub use errors::Error;
pub use group::{Group, GroupUpdate, Groups};
pub use light::{
    Capabilities, ColorTemperatureRange, Control, Light, LightConfig, Lights, NewLights,
    SoftwareUpdate, Startup, Streaming,
};
pub use pairing::{Pairing, PairingState};
pub use payload::StatePayload;
pub use response::{ApiError, ApiResponse, Envelope};
pub use status::{GroupAction, GroupState, LightState};
pub use transport::{BridgeIdentity, Reply, Transport};
pub use types::{
    Alert, Brightness, Color, ColorCommand, ColorTemperature, Effect, GroupType, PowerMode,
    Saturation, to_bridge_color,
};
