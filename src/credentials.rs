//! The caller's own requests and credential retrieval
//!
//! Retrieval over several requests is isolated per item: every request is
//! attempted, and each gets its own [`CredentialOutcome`].

use crate::protocol::{MyRequest, MyRequestList};
use crate::session::{decode, ensure_success, Session};
use crate::transport::Method;
use crate::{Result, VaultError};

const MY_REQUESTS_PATH: &str = "/PasswordVault/API/MyRequests";
const ACCOUNTS_PATH: &str = "/PasswordVault/WebServices/PIMServices.svc/Accounts";

/// Result of fetching the credential for one of the caller's requests
#[derive(Debug)]
pub struct CredentialOutcome<'a> {
    pub request: &'a MyRequest,
    pub credential: Result<String>,
}

impl Session {
    /// Fetch all of the caller's own requests that have not expired,
    /// whether or not they are still waiting.
    ///
    /// The vault may report an error code inside a 200 response; that is
    /// surfaced as [`VaultError::Remote`].
    pub fn list_my_requests(&self) -> Result<Vec<MyRequest>> {
        let request = self
            .authorized(Method::Get, MY_REQUESTS_PATH)?
            .query("onlywaiting", "false")
            .query("expired", "false");

        let response = ensure_success(self.send(request)?)?;
        let list: MyRequestList = decode(&response)?;

        if let Some((code, message)) = list.remote_error() {
            return Err(VaultError::Remote { code, message });
        }

        tracing::debug!(count = list.my_requests.len(), "fetched own requests");
        Ok(list.my_requests)
    }

    /// Fetch the credential for the account behind `request`.
    ///
    /// The body is returned as-is; depending on vault configuration it is
    /// plain text or JSON.
    pub fn fetch_credential(&self, request: &MyRequest) -> Result<String> {
        let path = format!(
            "{ACCOUNTS_PATH}/{}/Credentials",
            urlencoding::encode(&request.account_details.account_id)
        );
        let http_request = self.authorized(Method::Get, &path)?;

        let response = ensure_success(self.send(http_request)?)?;
        Ok(response.text())
    }

    /// Fetch credentials for each request in order.
    ///
    /// A failure on one request is logged and recorded in its outcome; the
    /// remaining requests are still attempted.
    pub fn retrieve_credentials<'a>(
        &self,
        requests: &'a [MyRequest],
    ) -> Vec<CredentialOutcome<'a>> {
        requests
            .iter()
            .map(|request| {
                let credential = self.fetch_credential(request);
                if let Err(e) = &credential {
                    tracing::warn!(
                        account = %request.account_details.properties.name,
                        account_id = %request.account_details.account_id,
                        error = %e,
                        "failed to retrieve credential"
                    );
                }
                CredentialOutcome { request, credential }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AccountDetails, AccountProperties};
    use crate::session::test_support::{logged_in, BASE_URL, TOKEN};
    use crate::transport::mock::MockTransport;

    fn my_request(account_id: &str, name: &str) -> MyRequest {
        MyRequest {
            account_details: AccountDetails {
                account_id: account_id.to_string(),
                properties: AccountProperties {
                    name: name.to_string(),
                    ..Default::default()
                },
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_list_my_requests() {
        let mock = MockTransport::new();
        let session = logged_in(&mock);
        mock.respond(
            200,
            r#"{
                "ErrorCode": "",
                "MyRequests": [
                    {"RequestID": "9_1", "Status": 2, "StatusTitle": "Confirmed",
                     "AccessFrom": "1543388400",
                     "AccountDetails": {"AccountID": "42_7", "Properties": {"Name": "web01-root"}}}
                ]
            }"#,
        );

        let requests = session.list_my_requests().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].status_title, "Confirmed");
        assert_eq!(requests[0].access_from.unwrap().timestamp(), 1543388400);

        let request = &mock.requests()[1];
        assert_eq!(request.url, format!("{BASE_URL}{MY_REQUESTS_PATH}"));
        assert_eq!(
            request.query,
            vec![("onlywaiting", "false"), ("expired", "false")]
        );
        assert_eq!(request.authorization.as_deref(), Some(TOKEN));
    }

    #[test]
    fn test_list_my_requests_null_fields() {
        let mock = MockTransport::new();
        let session = logged_in(&mock);
        mock.respond(
            200,
            r#"{
                "ErrorCode": null,
                "MyRequests": [
                    {"RequestID": "9_1", "Status": null, "StatusTitle": null,
                     "AccountDetails": {"AccountID": "42_7", "Properties": {"Name": "web01-root", "Safe": null}}}
                ]
            }"#,
        );

        let requests = session.list_my_requests().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].status, 0);
        assert!(requests[0].status_title.is_empty());
        assert_eq!(requests[0].account_details.properties.name, "web01-root");
        assert!(requests[0].account_details.properties.safe.is_empty());
    }

    #[test]
    fn test_list_my_requests_requires_login() {
        let mock = MockTransport::new();
        let session = Session::new(BASE_URL, Box::new(mock.clone()));

        let result = session.list_my_requests();
        assert!(matches!(result, Err(VaultError::NotAuthenticated)));
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_list_my_requests_embedded_error() {
        let mock = MockTransport::new();
        let session = logged_in(&mock);
        mock.respond(
            200,
            r#"{"ErrorCode":"PASWS041E","ErrorMessage":"No permission","MyRequests":[]}"#,
        );

        let err = session.list_my_requests().unwrap_err();
        assert!(matches!(err, VaultError::Remote { ref code, .. } if code == "PASWS041E"));
    }

    #[test]
    fn test_list_my_requests_empty() {
        let mock = MockTransport::new();
        let session = logged_in(&mock);
        mock.respond(200, r#"{"MyRequests":[]}"#);

        assert!(session.list_my_requests().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_credential_returns_body_verbatim() {
        let mock = MockTransport::new();
        let session = logged_in(&mock);
        mock.respond(200, "  s3cr3t!\"{}\n");

        let credential = session
            .fetch_credential(&my_request("42_7", "web01"))
            .unwrap();
        assert_eq!(credential, "  s3cr3t!\"{}\n");

        let request = &mock.requests()[1];
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url,
            format!("{BASE_URL}/PasswordVault/WebServices/PIMServices.svc/Accounts/42_7/Credentials")
        );
        assert_eq!(request.authorization.as_deref(), Some(TOKEN));
    }

    #[test]
    fn test_fetch_credential_escapes_account_id() {
        let mock = MockTransport::new();
        let session = logged_in(&mock);
        mock.respond(200, "secret");

        session
            .fetch_credential(&my_request("a/b?c#d", "odd"))
            .unwrap();

        assert_eq!(
            mock.requests()[1].url,
            format!("{BASE_URL}{ACCOUNTS_PATH}/a%2Fb%3Fc%23d/Credentials")
        );
    }

    #[test]
    fn test_fetch_credential_remote_error() {
        let mock = MockTransport::new();
        let session = logged_in(&mock);
        mock.respond(
            403,
            r#"{"ErrorCode":"PASWS013E","ErrorMessage":"Request is not confirmed"}"#,
        );

        let err = session
            .fetch_credential(&my_request("42_7", "web01"))
            .unwrap_err();
        assert!(matches!(err, VaultError::Remote { ref code, .. } if code == "PASWS013E"));
    }

    #[test]
    fn test_retrieve_continues_past_failure() {
        let mock = MockTransport::new();
        let session = logged_in(&mock);

        let requests = vec![
            my_request("1_1", "first"),
            my_request("1_2", "second"),
            my_request("1_3", "third"),
            my_request("1_4", "fourth"),
        ];
        mock.respond(200, "one");
        mock.respond(500, r#"{"ErrorCode":"PASWS999E","ErrorMessage":"boom"}"#);
        mock.respond(200, "three");
        mock.respond(200, "four");

        let outcomes = session.retrieve_credentials(&requests);
        assert_eq!(outcomes.len(), 4);
        assert_eq!(mock.request_count(), 5);

        let names: Vec<_> = outcomes
            .iter()
            .map(|o| o.request.account_details.properties.name.as_str())
            .collect();
        assert_eq!(names, ["first", "second", "third", "fourth"]);

        let credentials: Vec<_> = outcomes
            .iter()
            .map(|o| o.credential.as_deref().ok())
            .collect();
        assert_eq!(credentials, [Some("one"), None, Some("three"), Some("four")]);
        assert!(matches!(outcomes[1].credential, Err(VaultError::Remote { .. })));
    }

    #[test]
    fn test_retrieve_without_login() {
        let mock = MockTransport::new();
        let session = Session::new(BASE_URL, Box::new(mock.clone()));
        let requests = vec![my_request("1_1", "first")];

        let outcomes = session.retrieve_credentials(&requests);
        assert!(matches!(outcomes[0].credential, Err(VaultError::NotAuthenticated)));
        assert_eq!(mock.request_count(), 0);
    }
}
