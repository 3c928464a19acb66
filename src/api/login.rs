//! POST /login

use super::AuthApi;
use crate::error::ClientError;
use crate::http::ApiRequest;
use crate::ocsf;
use crate::types::{LoginRequest, LoginResponse};

impl AuthApi {
    /// Exchange credentials for a session token and store it.
    ///
    /// Returns the whole response body, which may carry profile fields
    /// besides the token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = serde_json::to_value(LoginRequest { username, password })
            .map_err(|e| ClientError::Internal(e.to_string()))?;

        let result = self
            .gateway
            .send(self.prepare(ApiRequest::post("/login", body)))
            .await
            .and_then(|body| {
                let body = body.ok_or_else(|| ClientError::MalformedResponse("empty body".into()))?;
                serde_json::from_value::<LoginResponse>(body)
                    .map_err(|e| ClientError::MalformedResponse(e.to_string()))
            });

        match result {
            Ok(_) if self.is_cancelled() => Err(ClientError::Cancelled),
            Ok(resp) => {
                self.gateway.session().set_token(Some(&resp.token));
                ocsf::authentication_event(
                    ocsf::ACTIVITY_LOGON,
                    "Logon",
                    ocsf::STATUS_SUCCESS,
                    ocsf::SEVERITY_INFORMATIONAL,
                    Some(username),
                    "Login succeeded",
                );
                Ok(resp)
            }
            Err(ClientError::Cancelled) => Err(ClientError::Cancelled),
            Err(e) => {
                ocsf::authentication_event(
                    ocsf::ACTIVITY_LOGON,
                    "Logon",
                    ocsf::STATUS_FAILURE,
                    ocsf::SEVERITY_MEDIUM,
                    Some(username),
                    &format!("Login failed: {e}"),
                );
                Err(e)
            }
        }
    }
}
