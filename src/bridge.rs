//! Bridge client.

use log::info;

use crate::config::{ClientOptions, DISCOVERY_URL, DeviceType, PairingOptions};
use crate::discovery::discover_bridge_at;
use crate::errors::Error;
use crate::group::Groups;
use crate::light::Lights;
use crate::pairing::Pairing;
use crate::transport::{BridgeIdentity, Transport};

type Result<T> = std::result::Result<T, Error>;

/// A Hue bridge, reached locally or through the cloud API.
///
/// Resource calls need a whitelist identifier: pass one to [`Bridge::new`],
/// set it later with [`Bridge::login`], or obtain one with [`Bridge::pair`].
///
/// # Example
///
/// ```ignore
/// use hue_bridge_rs::{Bridge, ClientOptions, Color};
///
/// let bridge = Bridge::new("192.168.1.2", "my-username", ClientOptions::default())?;
/// for light in bridge.lights().get_all().await? {
///     println!("{} {}", light.id, light.name);
/// }
/// bridge.lights().set_color(1, &Color::rgb(255, 128, 0)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Bridge {
    transport: Transport,
}

impl Bridge {
    /// A local bridge at `host` (`ip` or `ip:port`), logged in as `username`.
    pub fn new(host: &str, username: &str, options: ClientOptions) -> Result<Self> {
        let mut bridge = Bridge::unauthenticated(host, options)?;
        bridge.login(username);
        Ok(bridge)
    }

    /// A local bridge without an identifier yet.
    pub fn unauthenticated(host: &str, options: ClientOptions) -> Result<Self> {
        let transport = Transport::new(&format!("http://{host}/api/"), options)?;
        Ok(Bridge::from_transport(transport))
    }

    pub fn from_transport(transport: Transport) -> Self {
        Bridge { transport }
    }

    /// The first bridge listed by the discovery service, without an identifier.
    pub async fn discover(options: ClientOptions) -> Result<Self> {
        let found = discover_bridge_at(DISCOVERY_URL, options.clone()).await?;
        info!("using bridge {} at {}", found.id, found.host);
        Bridge::unauthenticated(&found.host, options)
    }

    /// Register `device_type` with the bridge at `host` and log in as the new user.
    ///
    /// The link button must have been pressed shortly before; otherwise this
    /// fails with [`Error::LinkButtonNotPressed`].
    pub async fn create_user(
        host: &str,
        device_type: &DeviceType,
        options: ClientOptions,
    ) -> Result<Self> {
        let mut bridge = Bridge::unauthenticated(host, options)?;
        let pairing_options = PairingOptions::new(device_type.clone());
        let identity = Pairing::new(&bridge.transport, &pairing_options)
            .request_whitelist()
            .await?;
        bridge.login(&identity.identifier);
        Ok(bridge)
    }

    /// Run the link-button pairing flow and log in on success.
    pub async fn pair(&mut self, options: &PairingOptions) -> Result<BridgeIdentity> {
        let identity = Pairing::new(&self.transport, options).run().await?;
        self.login(&identity.identifier);
        Ok(identity)
    }

    /// Use an existing whitelist identifier.
    pub fn login(&mut self, username: &str) {
        self.transport.set_identifier(username);
    }

    pub fn host(&self) -> String {
        self.transport.host()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.transport.identifier()
    }

    pub fn identity(&self) -> Option<BridgeIdentity> {
        self.transport.identity()
    }

    pub fn lights(&self) -> Lights<'_> {
        Lights::new(&self.transport)
    }

    pub fn groups(&self) -> Groups<'_> {
        Groups::new(&self.transport)
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}
