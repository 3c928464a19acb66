//! Request/response DTOs for the Expensio backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// POST /login request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// POST /login response. Anything besides the token is kept in `profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// POST /register request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

/// GET /user/me response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UserInfo {
    pub email: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl UserInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }

    /// Avatar initials: first letters of first and last name, or of the
    /// email when either name is missing.
    pub fn initials(&self) -> String {
        let first = |s: &str| s.chars().next();
        match (first(&self.firstname), first(&self.lastname)) {
            (Some(f), Some(l)) => format!("{f}{l}").to_uppercase(),
            _ => first(&self.email)
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Error body the backend sends with failure statuses.
///
/// Fields that are not strings are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "string_or_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub message: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

impl ErrorBody {
    /// The first non-empty of `error` and `message`.
    pub fn into_message(self) -> Option<String> {
        self.error
            .filter(|e| !e.is_empty())
            .or(self.message.filter(|m| !m.is_empty()))
    }
}
