//! Request gateway: header construction and centralized response handling.
//!
//! Every call to the backend goes through [`Gateway::send`], which attaches
//! the bearer token when one is valid and interprets the response in one
//! place. A 401 from any endpoint runs the unauthorized protocol:
//! notify the installed handler, clear the session, fail the call.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::ocsf;
use crate::session::SessionManager;
use crate::types::ErrorBody;

/// Callback run when the backend rejects the session.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

const JSON: &str = "application/json";

/// One call to the backend.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    pub require_auth: bool,
    pub expect_body: bool,
    pub cancel: Option<CancellationToken>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
            require_auth: false,
            expect_body: true,
            cancel: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::new(Method::POST, path)
        }
    }

    /// Fail with `AuthRequired` instead of sending without a token.
    pub fn require_auth(mut self) -> Self {
        self.require_auth = true;
        self
    }

    /// Treat a successful response as bodiless.
    pub fn without_body(mut self) -> Self {
        self.expect_body = false;
        self
    }

    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Abandon the request once `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Issues requests to the backend on behalf of every client component.
pub struct Gateway {
    http_client: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl Gateway {
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            on_unauthorized: None,
        }
    }

    /// Install the callback run on every 401, replacing any previous one.
    pub fn with_unauthorized_handler(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// JSON content type, then `extra` (later keys win), then the bearer
    /// token if the session holds a valid one.
    pub fn build_headers(&self, extra: &HeaderMap, require_auth: bool) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }

        match self.session.valid_token() {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| ClientError::Internal(format!("unusable session token: {e}")))?;
                headers.insert(AUTHORIZATION, value);
            }
            None if require_auth => return Err(ClientError::AuthRequired),
            None => {}
        }

        Ok(headers)
    }

    /// Interpret a backend response.
    ///
    /// Returns `Ok(None)` for a success when `expect_body` is false.
    pub async fn handle_response(
        &self,
        response: reqwest::Response,
        expect_body: bool,
    ) -> Result<Option<Value>, ClientError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.reject_session(response.url().path());
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            let message = match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => serde_json::from_value::<ErrorBody>(body)
                    .unwrap_or_default()
                    .into_message()
                    .unwrap_or_else(|| "Request failed".into()),
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
            };
            tracing::debug!("Request failed with {}: {}", status, message);
            return Err(ClientError::RequestFailed(message));
        }

        if !expect_body {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    /// Build headers, issue the call, and handle the response.
    pub async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ClientError> {
        let headers = self.build_headers(&request.headers, request.require_auth)?;
        let url = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let cancel = request.cancel.unwrap_or_default();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = builder.send() => result?,
        };

        // A response for a view that is already gone must not touch the session.
        if cancel.is_cancelled() {
            tracing::debug!("Dropping response for cancelled request to {}", url);
            return Err(ClientError::Cancelled);
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.handle_response(response, request.expect_body) => result,
        };
        match result {
            Ok(_) if cancel.is_cancelled() => {
                tracing::debug!("Dropping body for cancelled request to {}", url);
                Err(ClientError::Cancelled)
            }
            other => other,
        }
    }

    fn reject_session(&self, path: &str) {
        tracing::warn!("Backend rejected session on {}", path);
        ocsf::authentication_event(
            ocsf::ACTIVITY_OTHER,
            "Other",
            ocsf::STATUS_FAILURE,
            ocsf::SEVERITY_MEDIUM,
            None,
            &format!("Session rejected by backend on {path}"),
        );

        if let Some(handler) = &self.on_unauthorized {
            handler();
        }
        self.session.logout();
    }
}
