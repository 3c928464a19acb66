//! GET /user/me

use super::AuthApi;
use crate::error::ClientError;
use crate::http::ApiRequest;
use crate::types::UserInfo;

impl AuthApi {
    /// Profile of the logged-in user. Requires a valid session token.
    pub async fn current_user(&self) -> Result<UserInfo, ClientError> {
        let body = self
            .gateway
            .send(self.prepare(ApiRequest::get("/user/me").require_auth()))
            .await?
            .ok_or_else(|| ClientError::MalformedResponse("empty body".into()))?;

        serde_json::from_value(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}
