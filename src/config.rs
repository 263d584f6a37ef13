//! Client, pairing and OAuth configuration.

use std::time::Duration;

use reqwest::Url;
use uuid::Uuid;

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

pub const AUTH_URL: &str = "https://api.meethue.com/oauth2/auth";
pub const TOKEN_URL: &str = "https://api.meethue.com/oauth2/token";
pub const API_URL: &str = "https://api.meethue.com/bridge/";
pub const DISCOVERY_URL: &str = "https://discovery.meethue.com/";

/// HTTP transport settings shared by every request of a [`crate::Bridge`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    /// Deadline applied to each request. Must be non-zero.
    pub timeout: Duration,
    /// A pre-configured client, e.g. one carrying OAuth credentials.
    pub http_client: Option<reqwest::Client>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            http_client: None,
        }
    }
}

impl ClientOptions {
    pub const DEFAULT_USER_AGENT: &'static str = concat!("hue-bridge-rs/", env!("CARGO_PKG_VERSION"));
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

/// Device-type label registered with the bridge whitelist (`app#device`).
///
/// # Examples
///
/// ```
/// use hue_bridge_rs::DeviceType;
///
/// let label = DeviceType::generate("my_app");
/// assert!(label.as_str().starts_with("my_app#"));
/// assert!(label.as_str().len() <= 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceType(String);

impl DeviceType {
    const MAX_LEN: usize = 40;

    pub fn new(label: &str) -> Self {
        DeviceType(label.chars().take(Self::MAX_LEN).collect())
    }

    /// `app#<random suffix>`, unique per call.
    pub fn generate(app: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let app: String = app.chars().take(Self::MAX_LEN - 9).collect();
        DeviceType(format!("{app}#{}", &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Settings for the link-button pairing flow.
#[derive(Debug, Clone)]
pub struct PairingOptions {
    pub device_type: DeviceType,
    /// How long to wait for the user to press the link button before pairing.
    pub link_button_grace: Duration,
}

impl Default for PairingOptions {
    fn default() -> Self {
        PairingOptions {
            device_type: DeviceType::generate("hue_bridge_rs"),
            link_button_grace: Self::DEFAULT_GRACE,
        }
    }
}

impl PairingOptions {
    pub const DEFAULT_GRACE: Duration = Duration::from_secs(30);

    pub fn new(device_type: DeviceType) -> Self {
        PairingOptions {
            device_type,
            ..Default::default()
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.link_button_grace = grace;
        self
    }
}

/// Credentials and endpoints for the Hue cloud OAuth2 flow.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub app_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Url,
    /// Defaults to the application id.
    pub device_id: Option<String>,
    pub device_name: String,
    pub auth_url: Url,
    pub token_url: Url,
    pub api_url: Url,
    /// How long to wait for the browser redirect.
    pub redirect_timeout: Duration,
}

impl OAuthConfig {
    pub const DEFAULT_REDIRECT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(app_id: &str, client_id: &str, client_secret: &str, redirect_uri: &str) -> Result<Self> {
        Ok(OAuthConfig {
            app_id: app_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: parse_url("redirect uri", redirect_uri)?,
            device_id: None,
            device_name: "browser".to_string(),
            auth_url: parse_url("auth url", AUTH_URL)?,
            token_url: parse_url("token url", TOKEN_URL)?,
            api_url: parse_url("api url", API_URL)?,
            redirect_timeout: Self::DEFAULT_REDIRECT_TIMEOUT,
        })
    }

    pub fn device_id(&self) -> &str {
        self.device_id.as_deref().unwrap_or(&self.app_id)
    }

    pub fn with_redirect_timeout(mut self, timeout: Duration) -> Self {
        self.redirect_timeout = timeout;
        self
    }

    pub fn with_token_url(mut self, url: &str) -> Result<Self> {
        self.token_url = parse_url("token url", url)?;
        Ok(self)
    }

    pub fn with_api_url(mut self, url: &str) -> Result<Self> {
        self.api_url = parse_url("api url", url)?;
        Ok(self)
    }

    /// `host:port` the callback listener binds to.
    pub(crate) fn listen_addr(&self) -> Result<String> {
        let host = self
            .redirect_uri
            .host_str()
            .ok_or_else(|| Error::configuration("redirect uri has no host"))?;
        let port = self
            .redirect_uri
            .port_or_known_default()
            .ok_or_else(|| Error::configuration("redirect uri has no port"))?;
        Ok(format!("{host}:{port}"))
    }
}

pub(crate) fn parse_url(what: &str, url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::configuration(format!("invalid {what} {url:?}: {e}")))
}
