//! OCSF (Open Cybersecurity Schema Framework) structured event logging.
//!
//! Session transitions are emitted via `tracing::info!` on the `ocsf`
//! target as one JSON object per line. Never panics.

use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

// OCSF event class UIDs
pub const CLASS_ACCOUNT_CHANGE: u32 = 3001;
pub const CLASS_AUTHENTICATION: u32 = 3002;

// Authentication activity IDs
pub const ACTIVITY_LOGON: u32 = 1;
pub const ACTIVITY_LOGOFF: u32 = 2;
pub const ACTIVITY_OTHER: u32 = 99; // Expiry, rejected session

// Account Change activity IDs
pub const ACTIVITY_CREATE: u32 = 1;

// Status IDs
pub const STATUS_SUCCESS: u32 = 1;
pub const STATUS_FAILURE: u32 = 2;

// Severity IDs
pub const SEVERITY_INFORMATIONAL: u32 = 1;
pub const SEVERITY_LOW: u32 = 2;
pub const SEVERITY_MEDIUM: u32 = 3;
pub const SEVERITY_HIGH: u32 = 4;

// The backend only issues tokens for username/password logins.
const AUTH_PROTOCOL_PASSWORD: u32 = 2;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn severity_name(id: u32) -> &'static str {
    match id {
        SEVERITY_INFORMATIONAL => "Informational",
        SEVERITY_LOW => "Low",
        SEVERITY_MEDIUM => "Medium",
        SEVERITY_HIGH => "High",
        _ => "Unknown",
    }
}

fn status_name(id: u32) -> &'static str {
    match id {
        STATUS_SUCCESS => "Success",
        _ => "Failure",
    }
}

fn emit(event: &serde_json::Value) {
    if let Ok(json) = serde_json::to_string(event) {
        tracing::info!(target: "ocsf", "{}", json);
    }
}

#[allow(clippy::too_many_arguments)]
fn build_event(
    class_uid: u32,
    class_name: &str,
    activity_id: u32,
    activity_name: &str,
    status_id: u32,
    severity_id: u32,
    user: Option<&str>,
    message: &str,
) -> serde_json::Value {
    let mut event = json!({
        "class_uid": class_uid,
        "class_name": class_name,
        "activity_id": activity_id,
        "activity_name": activity_name,
        "severity_id": severity_id,
        "severity": severity_name(severity_id),
        "status_id": status_id,
        "status": status_name(status_id),
        "time": now_millis(),
        "metadata": {
            "product": {
                "name": "expensio-client",
                "version": env!("CARGO_PKG_VERSION"),
                "vendor_name": "Expensio"
            }
        },
        "message": message,
    });

    if let Some(name) = user {
        event["actor"] = json!({
            "user": {
                "name": name,
                "type_id": 1,
                "type": "User"
            }
        });
    }

    event
}

/// Emit an OCSF Authentication (3002) event.
pub fn authentication_event(
    activity_id: u32,
    activity_name: &str,
    status_id: u32,
    severity_id: u32,
    user: Option<&str>,
    message: &str,
) {
    let mut event = build_event(
        CLASS_AUTHENTICATION,
        "Authentication",
        activity_id,
        activity_name,
        status_id,
        severity_id,
        user,
        message,
    );
    event["auth_protocol_id"] = json!(AUTH_PROTOCOL_PASSWORD);
    event["auth_protocol"] = json!("Password");
    emit(&event);
}

/// Emit an OCSF Account Change (3001) event, e.g. self-registration.
pub fn account_change_event(
    activity_id: u32,
    activity_name: &str,
    status_id: u32,
    severity_id: u32,
    user: Option<&str>,
    message: &str,
) {
    emit(&build_event(
        CLASS_ACCOUNT_CHANGE,
        "Account Change",
        activity_id,
        activity_name,
        status_id,
        severity_id,
        user,
        message,
    ));
}

/// Subject of a session token, for attributing events (best-effort).
pub fn subject_from_token(token: &str) -> Option<String> {
    crate::token::decode_claims(token).ok()?.sub
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_event_with_actor() {
        let event = build_event(
            CLASS_AUTHENTICATION,
            "Authentication",
            ACTIVITY_LOGON,
            "Logon",
            STATUS_SUCCESS,
            SEVERITY_INFORMATIONAL,
            Some("alice"),
            "Login succeeded",
        );
        assert_eq!(event["class_uid"], 3002);
        assert_eq!(event["status"], "Success");
        assert_eq!(event["severity"], "Informational");
        assert_eq!(event["actor"]["user"]["name"], "alice");
        assert_eq!(event["metadata"]["product"]["name"], "expensio-client");
    }

    #[test]
    fn test_build_event_without_actor() {
        let event = build_event(
            CLASS_ACCOUNT_CHANGE,
            "Account Change",
            ACTIVITY_CREATE,
            "Create",
            STATUS_FAILURE,
            SEVERITY_LOW,
            None,
            "Registration failed",
        );
        assert_eq!(event["status"], "Failure");
        assert!(event.get("actor").is_none());
    }

    #[test]
    fn test_subject_from_garbage_token() {
        assert!(subject_from_token("garbage").is_none());
    }
}
