//! Wire types for the vault REST API
//!
//! Field names follow the vault's PascalCase JSON. Most fields are optional in
//! practice, so strings default to empty and timestamps to `None`. The vault
//! also sends explicit `null` for fields it has no value for; those decode
//! the same as an absent key.

use serde::{Deserialize, Deserializer, Serialize};

use crate::time::VaultTime;

/// Payload for the logon endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogonRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub use_radius_authentication: bool,
    pub connection_number: u32,
}

impl<'a> LogonRequest<'a> {
    /// Password logon without a secondary factor, on connection slot 1
    pub fn new(username: &'a str, password: &'a str) -> Self {
        Self {
            username,
            password,
            use_radius_authentication: false,
            connection_number: 1,
        }
    }
}

/// Response from the logon endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LogonResponse {
    #[serde(rename = "CyberArkLogonResult")]
    pub logon_result: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

/// Error envelope the vault embeds in failed (and some successful) responses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ErrorResponse {
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl ErrorResponse {
    /// The reported code and message, if the code is non-empty
    pub fn remote_error(&self) -> Option<(String, String)> {
        remote_error(&self.error_code, &self.error_message)
    }
}

pub(crate) fn remote_error(
    code: &Option<String>,
    message: &Option<String>,
) -> Option<(String, String)> {
    match code.as_deref() {
        Some(code) if !code.is_empty() => {
            Some((code.to_string(), message.clone().unwrap_or_default()))
        }
        _ => None,
    }
}

/// Decode `null` as the type's default instead of failing
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Payload for the confirm endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfirmRequest<'a> {
    pub reason: &'a str,
}

/// Envelope returned when listing incoming requests
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IncomingRequestList {
    #[serde(deserialize_with = "null_as_default")]
    pub incoming_requests: Vec<IncomingRequest>,
    #[serde(deserialize_with = "null_as_default")]
    pub total: usize,
}

/// An access request awaiting the caller's decision
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IncomingRequest {
    #[serde(rename = "RequestID", deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub requestor_user_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub operation: String,
    pub access_from: Option<VaultTime>,
    pub access_to: Option<VaultTime>,
    #[serde(deserialize_with = "null_as_default")]
    pub account_details: AccountDetails,
}

/// Account a request refers to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccountDetails {
    #[serde(rename = "AccountID", deserialize_with = "null_as_default")]
    pub account_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub properties: AccountProperties,
}

/// Descriptive properties of an account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccountProperties {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub safe: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    pub last_used_date: Option<VaultTime>,
    #[serde(deserialize_with = "null_as_default")]
    pub last_used_by: String,
}

/// Envelope returned when listing the caller's own requests
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MyRequestList {
    #[serde(deserialize_with = "null_as_default")]
    pub my_requests: Vec<MyRequest>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl MyRequestList {
    pub fn remote_error(&self) -> Option<(String, String)> {
        remote_error(&self.error_code, &self.error_message)
    }
}

/// A request submitted by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MyRequest {
    #[serde(rename = "RequestID", deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub status_title: String,
    pub access_from: Option<VaultTime>,
    pub access_to: Option<VaultTime>,
    #[serde(deserialize_with = "null_as_default")]
    pub account_details: AccountDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logon_request_serialization() {
        let req = LogonRequest::new("CORPKEY", "hunter2");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": "CORPKEY",
                "password": "hunter2",
                "useRadiusAuthentication": false,
                "connectionNumber": 1,
            })
        );
    }

    #[test]
    fn test_confirm_request_serialization() {
        let json = serde_json::to_string(&ConfirmRequest { reason: "on call" }).unwrap();
        assert_eq!(json, r#"{"Reason":"on call"}"#);
    }

    #[test]
    fn test_error_response_requires_code() {
        let resp: ErrorResponse =
            serde_json::from_str(r#"{"ErrorCode":"","ErrorMessage":"ignored"}"#).unwrap();
        assert!(resp.remote_error().is_none());

        let resp: ErrorResponse = serde_json::from_str(r#"{"ErrorCode":null}"#).unwrap();
        assert!(resp.remote_error().is_none());

        let resp: ErrorResponse =
            serde_json::from_str(r#"{"ErrorCode":"PASWS013E","ErrorMessage":"bad"}"#).unwrap();
        assert_eq!(
            resp.remote_error(),
            Some(("PASWS013E".to_string(), "bad".to_string()))
        );
    }

    #[test]
    fn test_incoming_request_fixture() {
        let list: IncomingRequestList =
            serde_json::from_str(include_str!("../fixtures/response.json")).unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.incoming_requests.len(), 2);

        let req = &list.incoming_requests[0];
        assert_eq!(req.access_from.unwrap().timestamp(), 1543388400);
        assert_eq!(req.access_to.unwrap().timestamp(), 1543600800);
        assert_eq!(
            req.account_details
                .properties
                .last_used_date
                .unwrap()
                .timestamp(),
            1543404976
        );
    }

    #[test]
    fn test_my_request_decodes_with_missing_fields() {
        let list: MyRequestList = serde_json::from_str(
            r#"{"MyRequests":[{"Status":2,"StatusTitle":"Confirmed","AccountDetails":{"AccountID":"12_3"}}]}"#,
        )
        .unwrap();
        assert!(list.remote_error().is_none());

        let req = &list.my_requests[0];
        assert_eq!(req.status, 2);
        assert_eq!(req.account_details.account_id, "12_3");
        assert!(req.account_details.properties.name.is_empty());
        assert!(req.access_from.is_none());
    }

    #[test]
    fn test_null_fields_decode_as_default() {
        let list: MyRequestList = serde_json::from_str(
            r#"{
                "MyRequests": [{
                    "RequestID": null,
                    "Status": null,
                    "StatusTitle": null,
                    "AccessFrom": null,
                    "AccountDetails": {"AccountID": "12_3", "Properties": null}
                }],
                "ErrorCode": null
            }"#,
        )
        .unwrap();
        assert!(list.remote_error().is_none());

        let req = &list.my_requests[0];
        assert_eq!(req.status, 0);
        assert!(req.request_id.is_empty());
        assert!(req.status_title.is_empty());
        assert_eq!(req.account_details.account_id, "12_3");
        assert!(req.account_details.properties.name.is_empty());

        let list: IncomingRequestList =
            serde_json::from_str(r#"{"IncomingRequests":null,"Total":null}"#).unwrap();
        assert!(list.incoming_requests.is_empty());
        assert_eq!(list.total, 0);
    }
}
