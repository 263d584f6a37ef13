//! HTTP plumbing shared by every bridge operation.

use std::time::Duration;

use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ClientOptions, parse_url};
use crate::errors::Error;
use crate::response::check_rejection;

type Result<T> = std::result::Result<T, Error>;

/// The identity a transport authenticates with.
///
/// `identifier` is the whitelist username handed out by the bridge, either
/// locally or through the cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeIdentity {
    pub host: String,
    pub identifier: String,
}

/// Status and decoded body of a bridge reply.
///
/// `body` is `None` when the bridge answered with an empty body.
#[derive(Debug)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub body: Option<T>,
}

impl<T> Reply<T> {
    /// The decoded body, treating an empty reply as invalid.
    pub fn into_body(self) -> Result<T> {
        self.body
            .ok_or_else(|| Error::InvalidResponse(format!("empty body with status {}", self.status)))
    }

    /// The decoded body, or `T::default()` for an empty reply with a success status.
    pub fn into_body_or_default(self) -> Result<T>
    where
        T: Default,
    {
        match self.body {
            Some(body) => Ok(body),
            None if self.status.is_success() => Ok(T::default()),
            None => Err(Error::UnexpectedStatus {
                status: self.status,
                body: String::new(),
            }),
        }
    }
}

/// Sends JSON requests relative to a base URL, scoped by a bridge identifier.
///
/// Dropping a pending `send` future cancels the request.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    identifier: Option<String>,
    user_agent: HeaderValue,
    timeout: Duration,
}

impl Transport {
    pub fn new(base_url: &str, options: ClientOptions) -> Result<Self> {
        let base_url = parse_url("base url", base_url)?;
        let user_agent = HeaderValue::from_str(&options.user_agent)
            .map_err(|e| Error::configuration(format!("invalid user agent: {e}")))?;
        Ok(Transport {
            http: options.http_client.unwrap_or_default(),
            base_url,
            identifier: None,
            user_agent,
            timeout: options.timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Host (and port, if any) of the base URL.
    pub fn host(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn identity(&self) -> Option<BridgeIdentity> {
        self.identifier.as_ref().map(|identifier| BridgeIdentity {
            host: self.host(),
            identifier: identifier.clone(),
        })
    }

    pub(crate) fn set_identifier(&mut self, identifier: &str) {
        self.identifier = Some(identifier.to_string());
    }

    /// Send a request for `resource` on behalf of the bound identifier.
    ///
    /// The final URL is `base_url + identifier + "/" + resource`. The
    /// identifier is always a single path segment.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
    ) -> Result<Reply<T>> {
        let url = self.scoped_url(resource)?;
        self.execute(method, url, body).await
    }

    /// Send a request relative to the base URL, without the identifier.
    ///
    /// Only used before an identifier exists, i.e. while pairing.
    pub(crate) async fn send_unscoped<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Reply<T>> {
        let url = self.url(path)?;
        self.execute(method, url, body).await
    }

    fn scoped_url(&self, resource: &str) -> Result<Url> {
        let identifier = self
            .identifier
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::configuration("bridge identifier is missing"))?;
        self.url_from_segments(std::iter::once(identifier).chain(split_path(resource)))
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.url_from_segments(split_path(path))
    }

    /// Append `segments` to the base URL, each one percent-encoded on its own.
    fn url_from_segments<'s>(&self, segments: impl Iterator<Item = &'s str>) -> Result<Url> {
        if !self.base_url.path().ends_with('/') {
            return Err(Error::configuration(format!(
                "base url must have a trailing slash, but {:?} does not",
                self.base_url.as_str()
            )));
        }
        let mut segments = segments.peekable();
        let mut url = self.base_url.clone();
        if segments.peek().is_none() {
            return Ok(url);
        }
        url.path_segments_mut()
            .map_err(|_| Error::configuration("base url cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Reply<T>> {
        if self.timeout.is_zero() {
            return Err(Error::InvalidContext(
                "request timeout must be greater than zero".into(),
            ));
        }

        debug!("{method} {url}");
        let mut request = self
            .http
            .request(method, url)
            .timeout(self.timeout)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, self.user_agent.clone());
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(Error::JsonDump)?;
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let response = request.send().await.map_err(Error::Network)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(Error::Network)?;
        debug!("bridge replied {status} with {} bytes", bytes.len());

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Reply { status, body: None });
        }

        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(Error::UnexpectedStatus {
                    status,
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            Err(e) => return Err(Error::JsonLoad(e)),
        };

        check_rejection(&value)?;
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        let body = serde_json::from_value(value).map_err(Error::JsonLoad)?;
        Ok(Reply {
            status,
            body: Some(body),
        })
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
