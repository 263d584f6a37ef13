//! In-process mock bridge for tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use serde_json::Value;

use crate::bridge::Bridge;
use crate::config::ClientOptions;

/// Serve `router` on an ephemeral local port for the rest of the test.
pub(crate) async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A port nothing is listening on.
pub(crate) fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// A bridge client logged in as `username` against a mock server.
pub(crate) fn bridge(addr: SocketAddr) -> Bridge {
    Bridge::new(&addr.to_string(), "username", ClientOptions::default()).unwrap()
}

/// Request bodies captured by a mock handler.
pub(crate) type Captured = Arc<Mutex<Vec<Value>>>;

pub(crate) fn captured() -> Captured {
    Arc::new(Mutex::new(Vec::new()))
}
