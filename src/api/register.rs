//! POST /register

use super::AuthApi;
use crate::error::ClientError;
use crate::http::ApiRequest;
use crate::ocsf;
use crate::types::{LoginResponse, RegisterRequest};

impl AuthApi {
    /// Create an account, then log straight in with the new credentials.
    ///
    /// The register endpoint answers with an empty body; the returned value
    /// is whatever the follow-up login returns.
    pub async fn register(&self, fields: &RegisterRequest) -> Result<LoginResponse, ClientError> {
        let body =
            serde_json::to_value(fields).map_err(|e| ClientError::Internal(e.to_string()))?;

        if let Err(e) = self
            .gateway
            .send(self.prepare(ApiRequest::post("/register", body).without_body()))
            .await
        {
            if !matches!(e, ClientError::Cancelled) {
                ocsf::account_change_event(
                    ocsf::ACTIVITY_CREATE,
                    "Create",
                    ocsf::STATUS_FAILURE,
                    ocsf::SEVERITY_LOW,
                    Some(&fields.email),
                    &format!("Registration failed: {e}"),
                );
            }
            return Err(e);
        }

        ocsf::account_change_event(
            ocsf::ACTIVITY_CREATE,
            "Create",
            ocsf::STATUS_SUCCESS,
            ocsf::SEVERITY_INFORMATIONAL,
            Some(&fields.email),
            "Account registered",
        );

        self.login(&fields.email, &fields.password).await
    }
}
