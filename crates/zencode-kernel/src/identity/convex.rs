//! Profile lookups against a Convex deployment.
//!
//! Uses the deployment's public HTTP query API:
//!
//! ```text
//! POST <deployment>/api/query
//! {"path": "users:getUser", "args": {"userId": "<id>"}, "format": "json"}
//! ```
//!
//! The reply is `{"status": "success", "value": …}` or
//! `{"status": "error", "errorMessage": …}`. A `null` value means the
//! identity has no record.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use zencode_types::{IdentityId, UserProfile};

use super::{ProfileError, ProfileResult, ProfileService};
use crate::constants::PROFILE_QUERY_PATH;

/// HTTP client for the `users:getUser` query.
#[derive(Debug, Clone)]
pub struct ConvexProfileService {
    client: reqwest::Client,
    deployment_url: String,
}

impl ConvexProfileService {
    pub fn new(deployment_url: impl Into<String>) -> Self {
        let url: String = deployment_url.into();
        Self {
            client: reqwest::Client::new(),
            deployment_url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn deployment_url(&self) -> &str {
        &self.deployment_url
    }
}

#[async_trait]
impl ProfileService for ConvexProfileService {
    fn name(&self) -> &str {
        "convex"
    }

    async fn get_user(&self, identity: &IdentityId) -> ProfileResult<Option<UserProfile>> {
        let response = self
            .client
            .post(format!("{}/api/query", self.deployment_url))
            .json(&query_body(identity))
            .send()
            .await
            .map_err(|e| ProfileError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProfileError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ProfileError::Query(format!("HTTP {}: {}", status.as_u16(), text)));
        }
        parse_query_response(&text)
    }
}

pub(crate) fn query_body(identity: &IdentityId) -> Value {
    json!({
        "path": PROFILE_QUERY_PATH,
        "args": { "userId": identity.as_str() },
        "format": "json",
    })
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum QueryResponse {
    Success {
        #[serde(default)]
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

pub(crate) fn parse_query_response(text: &str) -> ProfileResult<Option<UserProfile>> {
    let response: QueryResponse =
        serde_json::from_str(text).map_err(|e| ProfileError::Malformed(e.to_string()))?;

    match response {
        QueryResponse::Error { error_message } => Err(ProfileError::Query(error_message)),
        QueryResponse::Success { value: Value::Null } => Ok(None),
        QueryResponse::Success { value } => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ProfileError::Malformed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_body_shape() {
        let body = query_body(&IdentityId::new("user_2abc"));
        assert_eq!(body["path"], "users:getUser");
        assert_eq!(body["args"]["userId"], "user_2abc");
        assert_eq!(body["format"], "json");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let service = ConvexProfileService::new("https://happy-otter-123.convex.cloud/");
        assert_eq!(service.deployment_url(), "https://happy-otter-123.convex.cloud");
    }

    #[test]
    fn test_parse_profile() {
        let text = r#"{
            "status": "success",
            "value": {
                "_id": "jd7abc",
                "_creationTime": 1718000000000.5,
                "userId": "user_2abc",
                "email": "ada@example.com",
                "name": "Ada",
                "isPro": true,
                "proSince": 1718000001000,
                "lemonSqueezyCustomerId": "cus_1",
                "lemonSqueezyOrderId": "ord_1"
            },
            "logLines": []
        }"#;
        let profile = parse_query_response(text).unwrap().unwrap();
        assert_eq!(profile.record_id, "jd7abc");
        assert_eq!(profile.user_id, IdentityId::new("user_2abc"));
        assert!(profile.is_pro);
        assert_eq!(profile.lemon_squeezy_order_id.as_deref(), Some("ord_1"));
    }

    #[test]
    fn test_parse_free_profile_without_optional_fields() {
        let text = r#"{"status":"success","value":{"_id":"jd7","userId":"u","email":"e","name":"n"}}"#;
        let profile = parse_query_response(text).unwrap().unwrap();
        assert!(!profile.is_pro);
        assert_eq!(profile.pro_since, None);
    }

    #[test]
    fn test_parse_null_is_none() {
        let text = r#"{"status":"success","value":null}"#;
        assert!(parse_query_response(text).unwrap().is_none());
    }

    #[test]
    fn test_parse_error_status() {
        let text = r#"{"status":"error","errorMessage":"Server Error"}"#;
        let err = parse_query_response(text).unwrap_err();
        assert!(matches!(err, ProfileError::Query(msg) if msg == "Server Error"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_query_response("<html>502</html>"),
            Err(ProfileError::Malformed(_))
        ));
        assert!(matches!(
            parse_query_response(r#"{"status":"success","value":{"name":"no id"}}"#),
            Err(ProfileError::Malformed(_))
        ));
    }
}
