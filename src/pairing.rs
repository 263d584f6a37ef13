//! Link-button pairing.
//!
//! A new user is whitelisted on the bridge in three steps: the user presses
//! the physical link button, the button is enabled through the config
//! endpoint, and the bridge is asked for a username.

use std::time::Duration;

use log::{debug, info};
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::config::PairingOptions;
use crate::errors::Error;
use crate::response::{ApiError, Envelope};
use crate::transport::{BridgeIdentity, Transport};

type Result<T> = std::result::Result<T, Error>;

/// Progress of a [`Pairing`] attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PairingState {
    #[default]
    Idle,
    AwaitingLinkButton,
    LinkButtonEnabled,
    WhitelistRequested,
    Paired(BridgeIdentity),
    Failed(String),
}

/// One pairing attempt against a bridge.
///
/// Requests go to the transport's base URL directly, so this works both for a
/// local bridge and for one reached through the cloud API.
#[derive(Debug)]
pub struct Pairing<'a> {
    transport: &'a Transport,
    options: &'a PairingOptions,
    state: PairingState,
}

impl<'a> Pairing<'a> {
    pub fn new(transport: &'a Transport, options: &'a PairingOptions) -> Self {
        Pairing {
            transport,
            options,
            state: PairingState::Idle,
        }
    }

    pub fn state(&self) -> &PairingState {
        &self.state
    }

    /// Wait for the link button, enable it and request a whitelist entry.
    ///
    /// A [`Error::LinkButtonNotPressed`] failure is not retried; start a new
    /// attempt once the button has been pressed.
    pub async fn run(&mut self) -> Result<BridgeIdentity> {
        self.state = PairingState::AwaitingLinkButton;
        self.wait_for_link_button(self.options.link_button_grace).await;
        self.enable_link_button().await?;
        self.request_whitelist().await
    }

    async fn wait_for_link_button(&self, grace: Duration) {
        info!(
            "press the link button on the bridge at {} within {}s",
            self.transport.host(),
            grace.as_secs()
        );
        tokio::time::sleep(grace).await;
    }

    /// `PUT 0/config {"linkbutton": true}`.
    pub async fn enable_link_button(&mut self) -> Result<()> {
        let result = self.put_link_button().await;
        match &result {
            Ok(()) => self.state = PairingState::LinkButtonEnabled,
            Err(e) => self.fail(e),
        }
        result
    }

    async fn put_link_button(&self) -> Result<()> {
        let body = json!({ "linkbutton": true });
        let reply = match self
            .transport
            .send_unscoped::<Envelope>(Method::PUT, "0/config", Some(&body))
            .await
        {
            Ok(reply) => reply,
            Err(Error::UnexpectedStatus { status, .. }) => return Err(rejected(status)),
            Err(e) => return Err(e),
        };
        if reply.status != StatusCode::OK {
            return Err(rejected(reply.status));
        }
        if let Some(envelope) = reply.body {
            envelope.check_all()?;
        }
        debug!("link button enabled");
        Ok(())
    }

    /// `POST {"devicetype": ...}` and take the username out of the reply.
    pub async fn request_whitelist(&mut self) -> Result<BridgeIdentity> {
        self.state = PairingState::WhitelistRequested;
        let result = self.post_device_type().await;
        match &result {
            Ok(identity) => {
                info!("whitelisted as {:?}", self.options.device_type.as_str());
                self.state = PairingState::Paired(identity.clone());
            }
            Err(e) => self.fail(e),
        }
        result
    }

    async fn post_device_type(&self) -> Result<BridgeIdentity> {
        let body = json!({ "devicetype": self.options.device_type.as_str() });
        let envelope: Envelope = self
            .transport
            .send_unscoped(Method::POST, "", Some(&body))
            .await?
            .into_body()?;
        Ok(BridgeIdentity {
            host: self.transport.host(),
            identifier: envelope.first_string("username")?,
        })
    }

    fn fail(&mut self, err: &Error) {
        self.state = PairingState::Failed(err.to_string());
    }
}

fn rejected(status: StatusCode) -> Error {
    Error::BridgeRejected(ApiError::new(
        status.as_u16(),
        "/config/linkbutton",
        &format!("bridge returned HTTP {status}"),
    ))
}
