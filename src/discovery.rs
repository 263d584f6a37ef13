//! Bridge discovery through the Hue discovery service.

use log::{debug, warn};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::bridge::Bridge;
use crate::config::{ClientOptions, DISCOVERY_URL};
use crate::errors::Error;
use crate::transport::Transport;

type Result<T> = std::result::Result<T, Error>;

/// A bridge listed by the discovery service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredBridge {
    /// Bridge id, derived from its MAC address
    pub id: String,
    /// Address of the bridge on the local network
    #[serde(rename = "internalipaddress")]
    pub host: String,
}

impl DiscoveredBridge {
    /// Connect to this bridge as an already whitelisted user.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let found = discover_bridge().await?;
    /// let bridge = found.into_bridge("my-username", ClientOptions::default())?;
    /// ```
    pub fn into_bridge(self, username: &str, options: ClientOptions) -> Result<Bridge> {
        Bridge::new(&self.host, username, options)
    }
}

/// List every bridge the discovery service knows for this network.
///
/// # Examples
///
/// ```ignore
/// use hue_bridge_rs::discover_bridges;
///
/// let bridges = discover_bridges().await?;
/// for bridge in bridges {
///     println!("  {} - {}", bridge.id, bridge.host);
/// }
/// ```
pub async fn discover_bridges() -> Result<Vec<DiscoveredBridge>> {
    discover_bridges_at(DISCOVERY_URL, ClientOptions::default()).await
}

/// Same as [`discover_bridges`], against another discovery server.
///
/// `url` must end with a `/`.
pub async fn discover_bridges_at(
    url: &str,
    options: ClientOptions,
) -> Result<Vec<DiscoveredBridge>> {
    let transport = Transport::new(url, options)?;
    let bridges: Vec<DiscoveredBridge> = transport
        .send_unscoped(Method::GET, "", None)
        .await?
        .into_body_or_default()?;
    debug!("discovery listed {} bridge(s)", bridges.len());
    Ok(bridges)
}

/// The first bridge found on the network.
///
/// With several bridges the pick depends on the order the service lists
/// them in; use [`discover_bridges`] to choose one explicitly.
pub async fn discover_bridge() -> Result<DiscoveredBridge> {
    discover_bridge_at(DISCOVERY_URL, ClientOptions::default()).await
}

/// Same as [`discover_bridge`], against another discovery server.
pub async fn discover_bridge_at(url: &str, options: ClientOptions) -> Result<DiscoveredBridge> {
    let bridges = discover_bridges_at(url, options).await?;
    if bridges.len() > 1 {
        warn!(
            "found {} bridges, using the first one ({})",
            bridges.len(),
            bridges[0].host
        );
    }
    bridges.into_iter().next().ok_or(Error::NoBridgeFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::{Json, Router, routing::get};
    use serde_json::{Value, json};

    async fn discovery_server(listing: Value) -> String {
        let router = Router::new().route("/", get(move || async move { Json(listing) }));
        format!("http://{}/", testing::serve(router).await)
    }

    #[tokio::test]
    async fn test_discover_bridges() {
        let url = discovery_server(json!([
            {"id": "001788fffe100491", "internalipaddress": "192.168.2.23"},
            {"id": "001788fffe09a168", "internalipaddress": "192.168.2.42", "port": 443}
        ]))
        .await;

        let bridges = discover_bridges_at(&url, ClientOptions::default()).await.unwrap();
        assert_eq!(bridges.len(), 2);
        assert_eq!(bridges[1].host, "192.168.2.42");

        let first = discover_bridge_at(&url, ClientOptions::default()).await.unwrap();
        assert_eq!(first.id, "001788fffe100491");

        let bridge = first.into_bridge("username", ClientOptions::default()).unwrap();
        assert_eq!(bridge.host(), "192.168.2.23");
        assert_eq!(bridge.identifier(), Some("username"));
    }

    #[tokio::test]
    async fn test_no_bridge_found() {
        let url = discovery_server(json!([])).await;
        let err = discover_bridge_at(&url, ClientOptions::default()).await.unwrap_err();
        assert_eq!(err, Error::NoBridgeFound);
    }

    #[tokio::test]
    async fn test_discovery_url_needs_trailing_slash() {
        let err = discover_bridges_at("http://127.0.0.1:9/discover", ClientOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
