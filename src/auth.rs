//! Hue cloud OAuth2 authorization-code flow.
//!
//! [`Authenticator::authenticate`] runs the whole flow: it builds the
//! authorization URL, hands it to the user, waits for the browser redirect on
//! a temporary local listener and exchanges the returned code for a
//! [`Token`]. [`Authenticator::client_for`] then builds a [`Bridge`] that
//! talks to the cloud API with that token.
//!
//! Callers running their own HTTP server can drive the steps separately with
//! [`Authenticator::begin`], [`Authenticator::authorization_url`],
//! [`validate_redirect`] and [`Authenticator::exchange`].

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use tokio::sync::{Notify, oneshot};

use crate::bridge::Bridge;
use crate::config::{ClientOptions, OAuthConfig};
use crate::errors::Error;
use crate::transport::Transport;

type Result<T> = std::result::Result<T, Error>;

const STATE_TOKEN_LEN: usize = 32;

const SUCCESS_PAGE: &str = "<!DOCTYPE html>
<html><head><title>Hue bridge authorized</title></head>
<body><h1>Access granted</h1><p>You can close this window and return to the application.</p></body></html>";

const FAILURE_PAGE: &str = "<!DOCTYPE html>
<html><head><title>Hue bridge authorization failed</title></head>
<body><h1>Access not granted</h1><p>The authorization could not be completed. Return to the application for details.</p></body></html>";

/// An access token issued by the Hue cloud.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds. The cloud reports it as a string.
    #[serde(alias = "access_token_expires_in")]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub expires_in: Option<u64>,
}

impl Token {
    /// The cloud answers with a non-standard token type; requests need `Bearer`.
    pub fn normalize(mut self) -> Self {
        self.token_type = "Bearer".to_string();
        self
    }

    fn authorization(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("{} {}", self.token_type, self.access_token))
            .map_err(|e| Error::configuration(format!("invalid access token: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// One authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationState {
    pub state_token: String,
    pub redirect_uri: Url,
    /// After this the redirect is no longer awaited.
    pub expiry: Instant,
}

/// Progress of the last [`Authenticator::authenticate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Idle,
    AuthorizationRequested,
    AwaitingRedirect,
    Exchanged,
    TimedOut,
    Denied,
}

/// Query parameters of the OAuth redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RedirectQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Check a redirect against the attempt it belongs to and return the code.
///
/// A redirect carrying `error` is [`Error::Denied`], one without `code` is
/// [`Error::MissingCode`], and one whose `state` differs from the generated
/// token is [`Error::StateMismatch`] even when the code is valid.
pub fn validate_redirect(state: &AuthorizationState, query: &RedirectQuery) -> Result<String> {
    if let Some(error) = &query.error {
        return Err(Error::Denied(error.clone()));
    }
    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or(Error::MissingCode)?;
    if query.state.as_deref() != Some(state.state_token.as_str()) {
        return Err(Error::StateMismatch);
    }
    Ok(code.to_string())
}

/// Exchanges authorization codes at the token endpoint.
#[derive(Debug, Clone)]
struct TokenEndpoint {
    http: reqwest::Client,
    token_url: Url,
    redirect_uri: Url,
    client_id: String,
    client_secret: String,
}

impl TokenEndpoint {
    async fn exchange(&self, code: &str) -> Result<Token> {
        debug!("exchanging authorization code at {}", self.token_url);
        let response = self
            .http
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(Error::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Network)?;
        if !status.is_success() {
            return Err(Error::TokenExchange { status, body });
        }
        let token: Token = serde_json::from_str(&body).map_err(Error::JsonLoad)?;
        Ok(token.normalize())
    }
}

type Opener = Box<dyn Fn(&Url) + Send + Sync>;

/// Drives the OAuth flow for one application.
///
/// Each instance owns its random source for state tokens. Only one
/// [`authenticate`](Self::authenticate) call can hold the redirect port at a
/// time; a concurrent one fails to bind.
pub struct Authenticator {
    config: OAuthConfig,
    http: reqwest::Client,
    rng: StdRng,
    opener: Option<Opener>,
    phase: AuthPhase,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("client_id", &self.config.client_id)
            .field("redirect_uri", &self.config.redirect_uri.as_str())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(config: OAuthConfig) -> Self {
        Authenticator {
            config,
            http: reqwest::Client::new(),
            rng: StdRng::from_entropy(),
            opener: None,
            phase: AuthPhase::Idle,
        }
    }

    /// Open the authorization URL for the user, typically in a browser.
    ///
    /// The URL is logged either way.
    pub fn with_opener(mut self, opener: impl Fn(&Url) + Send + Sync + 'static) -> Self {
        self.opener = Some(Box::new(opener));
        self
    }

    /// Replace the OAuth client credentials.
    pub fn set_credentials(&mut self, client_id: &str, client_secret: &str) {
        self.config.client_id = client_id.to_string();
        self.config.client_secret = client_secret.to_string();
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    /// Start an attempt with a fresh state token.
    pub fn begin(&mut self) -> AuthorizationState {
        let state_token: String = (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(STATE_TOKEN_LEN)
            .map(char::from)
            .collect();
        self.phase = AuthPhase::AuthorizationRequested;
        AuthorizationState {
            state_token,
            redirect_uri: self.config.redirect_uri.clone(),
            expiry: Instant::now() + self.config.redirect_timeout,
        }
    }

    pub fn authorization_url(&self, state: &AuthorizationState) -> Url {
        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", state.redirect_uri.as_str())
            .append_pair("state", &state.state_token)
            .append_pair("appid", &self.config.app_id)
            .append_pair("deviceid", self.config.device_id())
            .append_pair("devicename", &self.config.device_name);
        url
    }

    /// Exchange an authorization code for a token with type `Bearer`.
    pub async fn exchange(&self, code: &str) -> Result<Token> {
        self.token_endpoint().exchange(code).await
    }

    /// A bridge on the cloud API that sends `token` with every request.
    ///
    /// The bridge has no whitelist identifier yet; [`Bridge::pair`] or
    /// [`Bridge::login`] provide one.
    pub fn client_for(&self, token: &Token, options: ClientOptions) -> Result<Bridge> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token.authorization()?);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(Error::Network)?;
        let transport = Transport::new(self.config.api_url.as_str(), options.with_http_client(http))?;
        Ok(Bridge::from_transport(transport))
    }

    /// Run the full flow and return the exchanged token.
    ///
    /// Fails with [`Error::TimedOut`] if no redirect arrives within the
    /// configured timeout; the redirect port is free again by then.
    pub async fn authenticate(&mut self) -> Result<Token> {
        let state = self.begin();
        let url = self.authorization_url(&state);
        info!("open {url} in a browser to grant access to the bridge");
        if let Some(open) = &self.opener {
            open(&url);
        }

        let addr = self.config.listen_addr()?;
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::socket("bind", e))?;
        debug!("waiting for the redirect on {addr}{}", state.redirect_uri.path());
        self.phase = AuthPhase::AwaitingRedirect;

        let (tx, rx) = oneshot::channel();
        let shutdown = Arc::new(Notify::new());
        let callback = Callback {
            state: state.clone(),
            endpoint: self.token_endpoint(),
            result: Arc::new(Mutex::new(Some(tx))),
            shutdown: shutdown.clone(),
        };
        let router = Router::new()
            .route(state.redirect_uri.path(), get(handle_redirect))
            .with_state(callback);
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        });

        match tokio::time::timeout(self.config.redirect_timeout, rx).await {
            Ok(Ok(result)) => {
                self.phase = match result {
                    Ok(_) => AuthPhase::Exchanged,
                    Err(_) => AuthPhase::Denied,
                };
                result
            }
            Ok(Err(_)) => {
                self.phase = AuthPhase::Denied;
                Err(Error::ListenerClosed)
            }
            Err(_) => {
                server.abort();
                let _ = server.await;
                warn!("no redirect received within {:?}", self.config.redirect_timeout);
                self.phase = AuthPhase::TimedOut;
                Err(Error::TimedOut)
            }
        }
    }

    fn token_endpoint(&self) -> TokenEndpoint {
        TokenEndpoint {
            http: self.http.clone(),
            token_url: self.config.token_url.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
        }
    }
}

#[derive(Clone)]
struct Callback {
    state: AuthorizationState,
    endpoint: TokenEndpoint,
    result: Arc<Mutex<Option<oneshot::Sender<Result<Token>>>>>,
    shutdown: Arc<Notify>,
}

async fn handle_redirect(
    State(callback): State<Callback>,
    query: std::result::Result<Query<RedirectQuery>, QueryRejection>,
) -> Html<&'static str> {
    let checked = match query {
        Ok(Query(query)) => validate_redirect(&callback.state, &query),
        Err(rejection) => Err(Error::Denied(format!(
            "malformed redirect: {}",
            rejection.body_text()
        ))),
    };
    let result = match checked {
        Ok(code) => callback.endpoint.exchange(&code).await,
        Err(e) => {
            warn!("rejected OAuth redirect: {e}");
            Err(e)
        }
    };
    let page = if result.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };

    let sender = callback
        .result
        .lock()
        .ok()
        .and_then(|mut sender| sender.take());
    if let Some(sender) = sender {
        let _ = sender.send(result);
    }
    // the response is still written after shutdown starts
    callback.shutdown.notify_one();
    Html(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::http::HeaderMap as RequestHeaders;
    use axum::routing::post;
    use axum::{Form, Json};
    use reqwest::Method;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::time::Duration;

    fn config(port: u16) -> OAuthConfig {
        OAuthConfig::new(
            "my-app",
            "client-id",
            "client-secret",
            &format!("http://127.0.0.1:{port}/callback"),
        )
        .unwrap()
    }

    fn attempt(token: &str) -> AuthorizationState {
        AuthorizationState {
            state_token: token.to_string(),
            redirect_uri: Url::parse("http://127.0.0.1:8181/callback").unwrap(),
            expiry: Instant::now(),
        }
    }

    fn query(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> RedirectQuery {
        RedirectQuery {
            code: code.map(String::from),
            state: state.map(String::from),
            error: error.map(String::from),
        }
    }

    /// Opener that follows the authorization URL with a redirect to `port`.
    ///
    /// `query` builds the redirect query from the generated state token.
    fn redirecting_opener(
        port: u16,
        query: fn(&str) -> String,
    ) -> impl Fn(&Url) + Send + Sync + 'static {
        move |url: &Url| {
            let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
            let redirect = format!("http://127.0.0.1:{port}/callback?{}", query(&pairs["state"]));
            tokio::spawn(async move {
                for _ in 0..100 {
                    if reqwest::get(redirect.as_str()).await.is_ok() {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            });
        }
    }

    #[test]
    fn test_authorization_url() {
        let mut auth = Authenticator::new(config(8181));
        let state = auth.begin();
        assert_eq!(state.state_token.len(), STATE_TOKEN_LEN);
        assert!(state.state_token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(auth.phase(), AuthPhase::AuthorizationRequested);

        let url = auth.authorization_url(&state);
        assert!(url.as_str().starts_with(crate::config::AUTH_URL));
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "client-id");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["redirect_uri"], "http://127.0.0.1:8181/callback");
        assert_eq!(pairs["state"], state.state_token);
        assert_eq!(pairs["appid"], "my-app");
        assert_eq!(pairs["deviceid"], "my-app");
        assert_eq!(pairs["devicename"], "browser");
    }

    #[test]
    fn test_state_tokens_differ() {
        let mut auth = Authenticator::new(config(8181));
        assert_ne!(auth.begin().state_token, auth.begin().state_token);
    }

    #[test]
    fn test_validate_redirect() {
        let state = attempt("abc");
        assert_eq!(
            validate_redirect(&state, &query(Some("code"), Some("abc"), None)).unwrap(),
            "code"
        );
        assert_eq!(
            validate_redirect(&state, &query(Some("code"), Some("abd"), None)).unwrap_err(),
            Error::StateMismatch
        );
        assert_eq!(
            validate_redirect(&state, &query(Some("code"), None, None)).unwrap_err(),
            Error::StateMismatch
        );
        assert_eq!(
            validate_redirect(&state, &query(None, Some("abc"), None)).unwrap_err(),
            Error::MissingCode
        );
        assert_eq!(
            validate_redirect(&state, &query(Some("code"), Some("abc"), Some("access_denied")))
                .unwrap_err(),
            Error::Denied("access_denied".into())
        );
    }

    #[test]
    fn test_token_decoding() {
        let token: Token = serde_json::from_value(json!({
            "access_token": "AbCdEf",
            "access_token_expires_in": "604799",
            "refresh_token": "GhIjKl",
            "token_type": "BearerToken"
        }))
        .unwrap();
        assert_eq!(token.expires_in, Some(604799));
        assert_eq!(token.normalize().token_type, "Bearer");

        let token: Token =
            serde_json::from_value(json!({"access_token": "x", "expires_in": 3600})).unwrap();
        assert_eq!(token.expires_in, Some(3600));
        assert_eq!(token.refresh_token, None);
    }

    #[tokio::test]
    async fn test_state_mismatch_is_rejected() {
        let port = testing::free_port();
        let mut auth =
            Authenticator::new(config(port)).with_opener(redirecting_opener(port, |_| {
            "code=the-code&state=forged".to_string()
        }));

        let err = auth.authenticate().await.unwrap_err();
        assert_eq!(err, Error::StateMismatch);
        assert_eq!(auth.phase(), AuthPhase::Denied);
    }

    #[tokio::test]
    async fn test_malformed_redirect_is_denied() {
        let port = testing::free_port();
        let mut auth = Authenticator::new(config(port)).with_opener(redirecting_opener(port, |state| {
            format!("code=first&code=second&state={state}")
        }));

        let err = auth.authenticate().await.unwrap_err();
        assert!(matches!(err, Error::Denied(_)));
        assert_eq!(auth.phase(), AuthPhase::Denied);
    }

    #[tokio::test]
    async fn test_timeout_releases_port() {
        let port = testing::free_port();
        let mut auth =
            Authenticator::new(config(port).with_redirect_timeout(Duration::from_millis(100)));

        let err = auth.authenticate().await.unwrap_err();
        assert_eq!(err, Error::TimedOut);
        assert_eq!(auth.phase(), AuthPhase::TimedOut);
        assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[tokio::test]
    async fn test_port_in_use() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let mut auth = Authenticator::new(config(port));

        let err = auth.authenticate().await.unwrap_err();
        assert!(matches!(err, Error::Socket { ref action, .. } if action == "bind"));
    }

    #[tokio::test]
    async fn test_authenticate_and_call_bridge() {
        let cloud = Router::new()
            .route(
                "/oauth2/token",
                post(|headers: RequestHeaders, Form(form): Form<HashMap<String, String>>| async move {
                    // base64("client-id:client-secret")
                    let basic = headers.get("authorization").and_then(|v| v.to_str().ok());
                    if basic != Some("Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=")
                        || form.get("code").map(String::as_str) != Some("the-code")
                        || form.get("grant_type").map(String::as_str) != Some("authorization_code")
                    {
                        return (axum::http::StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid"})));
                    }
                    (
                        axum::http::StatusCode::OK,
                        Json(json!({
                            "access_token": "cloud-token",
                            "access_token_expires_in": "604799",
                            "refresh_token": "refresh",
                            "token_type": "BearerToken"
                        })),
                    )
                }),
            )
            .route(
                "/bridge/remote-user/config",
                get(|headers: RequestHeaders| async move {
                    Json(json!({
                        "authorization": headers.get("authorization").and_then(|v| v.to_str().ok())
                    }))
                }),
            );
        let cloud = testing::serve(cloud).await;

        let port = testing::free_port();
        let config = config(port)
            .with_token_url(&format!("http://{cloud}/oauth2/token"))
            .unwrap()
            .with_api_url(&format!("http://{cloud}/bridge/"))
            .unwrap();
        let mut auth = Authenticator::new(config).with_opener(redirecting_opener(port, |state| {
            format!("code=the-code&state={state}")
        }));

        let token = auth.authenticate().await.unwrap();
        assert_eq!(auth.phase(), AuthPhase::Exchanged);
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.access_token, "cloud-token");

        let mut bridge = auth.client_for(&token, ClientOptions::default()).unwrap();
        assert_eq!(bridge.identifier(), None);
        bridge.login("remote-user");
        let body: Value = bridge
            .transport()
            .send(Method::GET, "config", None)
            .await
            .unwrap()
            .into_body()
            .unwrap();
        assert_eq!(body["authorization"], "Bearer cloud-token");
    }

    #[tokio::test]
    async fn test_failed_exchange() {
        let cloud = Router::new().route(
            "/oauth2/token",
            post(|| async { (axum::http::StatusCode::BAD_REQUEST, "invalid_grant") }),
        );
        let cloud = testing::serve(cloud).await;
        let config = config(8181)
            .with_token_url(&format!("http://{cloud}/oauth2/token"))
            .unwrap();
        let auth = Authenticator::new(config);

        match auth.exchange("bad-code").await {
            Err(Error::TokenExchange { status, body }) => {
                assert_eq!(status.as_u16(), 400);
                assert_eq!(body, "invalid_grant");
            }
            other => panic!("expected token exchange failure, got {other:?}"),
        }
    }
}
