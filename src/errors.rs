use reqwest::StatusCode;

use crate::response::ApiError;

/// All error types that can occur when talking to a Hue bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// The HTTP request never produced a response (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// A local socket operation failed, e.g. binding the OAuth callback listener.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// The bridge answered with an `error` element.
    #[error("bridge rejected request: {0}")]
    BridgeRejected(ApiError),

    /// The bridge refused to whitelist a new user because its link button
    /// was not pressed (error type 101). Press the button and try again.
    #[error("link button not pressed: {0}")]
    LinkButtonNotPressed(ApiError),

    /// The bridge answered with a non-success status and a body that is not JSON.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    /// The bridge answered with JSON of an unexpected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Attempted to send a [`crate::StatePayload`] with no attributes set.
    #[error("invalid payload; no attributes set")]
    NoAttribute,

    /// The discovery endpoint did not list any bridge.
    #[error("no bridge found on your network")]
    NoBridgeFound,

    /// The OAuth redirect carried a `state` other than the one we generated.
    #[error("redirect state parameter doesn't match")]
    StateMismatch,

    /// The OAuth redirect carried no authorization code.
    #[error("redirect did not include an authorization code")]
    MissingCode,

    /// The OAuth redirect carried an `error` parameter.
    #[error("authorization denied: {0}")]
    Denied(String),

    /// No OAuth redirect arrived before the deadline.
    #[error("could not authenticate on time")]
    TimedOut,

    /// The callback listener stopped without handing over a result.
    #[error("callback listener closed before a redirect was handled")]
    ListenerClosed,

    /// The token endpoint refused the authorization code.
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchange { status: StatusCode, body: String },

    /// Malformed base URL, redirect URI or missing bridge identifier.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A request was attempted without a usable deadline.
    #[error("invalid request context: {0}")]
    InvalidContext(String),

    /// The color could not be parsed as RGB or hex.
    #[error("unsupported color: {0}")]
    UnsupportedColor(String),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Error::Configuration(reason.into())
    }

    /// Map a bridge error element to the matching variant.
    pub fn from_bridge(err: ApiError) -> Self {
        if err.is_link_button_not_pressed() {
            Error::LinkButtonNotPressed(err)
        } else {
            Error::BridgeRejected(err)
        }
    }

    /// The bridge error element behind this failure, if any.
    pub fn bridge_error(&self) -> Option<&ApiError> {
        match self {
            Error::BridgeRejected(err) | Error::LinkButtonNotPressed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_link_button_not_pressed(&self) -> bool {
        matches!(self, Error::LinkButtonNotPressed(_))
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
