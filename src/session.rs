//! Session client for the vault
//!
//! A [`Session`] owns the base URL, the transport and the session token. The
//! expected lifecycle is strictly sequential: log in once, run any number of
//! operations, then log out and drop the session.

use serde::de::DeserializeOwned;

use crate::protocol::{remote_error, ErrorResponse, LogonRequest, LogonResponse};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use crate::{Result, VaultError};

const LOGON_PATH: &str =
    "/PasswordVault/WebServices/auth/Cyberark/CyberArkAuthenticationService.svc/Logon";
const LOGOFF_PATH: &str =
    "/PasswordVault/WebServices/auth/Cyberark/CyberArkAuthenticationService.svc/Logoff";

/// An authenticated connection to one vault
pub struct Session {
    base_url: String,
    transport: Box<dyn Transport>,
    /// Empty until a successful login
    token: String,
}

impl Session {
    /// Create an unauthenticated session against `base_url`
    pub fn new(base_url: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            token: String::new(),
        }
    }

    /// Whether a login has succeeded on this session
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    /// Log in with a username and password.
    ///
    /// On success the returned session token is kept and attached to every
    /// later request. A rejected login leaves the session unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AuthenticationFailed`] if the vault reports an
    /// error code or hands back no token, [`VaultError::Decode`] if the
    /// response is not the expected JSON, or [`VaultError::Transport`].
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let request = HttpRequest::new(Method::Post, self.url(LOGON_PATH))
            .json(&LogonRequest::new(username, password))?;

        let response = self.send(request)?;
        let logon: LogonResponse = decode(&response)?;

        if let Some((code, message)) = remote_error(&logon.error_code, &logon.error_message) {
            tracing::warn!(username, code = %code, "login rejected");
            return Err(VaultError::AuthenticationFailed { code, message });
        }

        match logon.logon_result.filter(|token| !token.is_empty()) {
            Some(token) => {
                self.token = token;
                tracing::info!(username, "logged in");
                Ok(())
            }
            None => Err(VaultError::AuthenticationFailed {
                code: format!("HTTP {}", response.status),
                message: "vault returned no session token".to_string(),
            }),
        }
    }

    /// Log out of the vault.
    ///
    /// Only transport failures are reported; whatever the vault answers is
    /// discarded. The token is left in place, so drop the session afterwards.
    pub fn logout(&self) -> Result<()> {
        let request = self.authorized(Method::Post, LOGOFF_PATH)?;
        self.send(request)?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Start a request carrying the session token.
    ///
    /// Fails with [`VaultError::NotAuthenticated`] before anything is sent
    /// if there is no token.
    pub(crate) fn authorized(&self, method: Method, path: &str) -> Result<HttpRequest> {
        if self.token.is_empty() {
            return Err(VaultError::NotAuthenticated);
        }
        Ok(HttpRequest::new(method, self.url(path)).authorization(self.token.as_str()))
    }

    pub(crate) fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            "sending vault request"
        );
        self.transport.execute(request)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a JSON response body
pub(crate) fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    Ok(serde_json::from_slice(&response.body)?)
}

/// Map a non-success response to an error.
///
/// The body is expected to be the vault's error envelope; a body that is not
/// JSON at all becomes [`VaultError::Decode`].
pub(crate) fn remote_failure(response: &HttpResponse) -> VaultError {
    match decode::<ErrorResponse>(response) {
        Ok(envelope) => match envelope.remote_error() {
            Some((code, message)) => VaultError::Remote { code, message },
            None => VaultError::Remote {
                code: format!("HTTP {}", response.status),
                message: "vault returned no error details".to_string(),
            },
        },
        Err(e) => e,
    }
}

/// Checks HTTP status; returns the response on success or the decoded error.
pub(crate) fn ensure_success(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(remote_failure(&response))
    }
}
