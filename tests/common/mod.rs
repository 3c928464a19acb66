//! Test utilities: token factory and a client wired to a wiremock backend.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use expensio_client::Client;
use expensio_client::config::Config;
use expensio_client::http::UnauthorizedHandler;
use expensio_client::session::memory::InMemoryStore;
use expensio_client::session::{AnyStore, SessionManager};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Secret the fake backend signs with. The client never checks it.
const SIGNING_SECRET: &[u8] = b"expensio-test-signing-secret";

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// HS256 token the way the backend issues them.
pub fn signed_token(sub: &str, exp: i64) -> String {
    let claims = json!({
        "sub": sub,
        "roles": ["USER"],
        "iat": now_secs(),
        "exp": exp,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SIGNING_SECRET),
    )
    .expect("failed to sign JWT")
}

/// Token valid for another hour.
pub fn fresh_token(sub: &str) -> String {
    signed_token(sub, now_secs() + 3600)
}

/// Token that expired long ago.
pub fn expired_token(sub: &str) -> String {
    signed_token(sub, 1000)
}

/// Unsigned token with an arbitrary payload.
pub fn make_unsigned_jwt(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(b"fake-signature");
    format!("{header}.{payload}.{sig}")
}

/// Counts how often the unauthorized handler fired.
#[derive(Clone, Default)]
pub struct HandlerCalls(Arc<AtomicUsize>);

impl HandlerCalls {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn handler(&self) -> UnauthorizedHandler {
        let calls = self.0.clone();
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// In-memory session manager plus its store, for inspecting storage.
pub fn memory_session() -> (Arc<SessionManager>, Arc<AnyStore>) {
    let config = Config::test_default();
    let store = Arc::new(AnyStore::Memory(InMemoryStore::new()));
    let session = Arc::new(SessionManager::new(store.clone(), config.token_key));
    (session, store)
}

/// Client pointed at `base_url` with an in-memory store and a counting
/// unauthorized handler.
pub fn build_test_client(base_url: &str) -> (Client, Arc<AnyStore>, HandlerCalls) {
    let mut config = Config::test_default();
    config.api_base_url = base_url.trim_end_matches('/').to_string();

    let (session, store) = memory_session();
    let calls = HandlerCalls::default();
    let client = Client::new(config, session, Some(calls.handler())).expect("client builds");
    (client, store, calls)
}

/// One-shot HTTP backend that sends the status line and headers at once
/// but holds back a JSON body for `stall`.
pub async fn stalled_body_server(body: String, stall: std::time::Duration) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stalled server");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.flush().await;
        tokio::time::sleep(stall).await;
        let _ = socket.write_all(body.as_bytes()).await;
    });

    format!("http://{addr}")
}
