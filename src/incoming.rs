//! Incoming requests: access requests waiting for the caller's approval

use crate::protocol::{ConfirmRequest, IncomingRequest, IncomingRequestList};
use crate::session::{decode, ensure_success, remote_failure, Session};
use crate::transport::Method;
use crate::Result;

const INCOMING_PATH: &str = "/PasswordVault/API/IncomingRequests";

impl Session {
    /// Fetch the requests that are waiting for the caller and not expired.
    ///
    /// An empty list is a normal outcome, not an error.
    pub fn list_incoming(&self) -> Result<IncomingRequestList> {
        let request = self
            .authorized(Method::Get, INCOMING_PATH)?
            .query("onlywaiting", "true")
            .query("expired", "false");

        let response = ensure_success(self.send(request)?)?;
        let list: IncomingRequestList = decode(&response)?;

        tracing::debug!(
            count = list.incoming_requests.len(),
            total = list.total,
            "fetched incoming requests"
        );
        Ok(list)
    }

    /// Confirm (approve) an incoming request with the given reason.
    ///
    /// Any 2xx answer counts as success, whatever the body holds. Confirming
    /// a request twice is left for the vault to decide.
    pub fn confirm(&self, incoming: &IncomingRequest, reason: &str) -> Result<()> {
        let path = format!(
            "{INCOMING_PATH}/{}/Confirm",
            urlencoding::encode(&incoming.request_id)
        );
        let request = self
            .authorized(Method::Post, &path)?
            .json(&ConfirmRequest { reason })?;

        let response = self.send(request)?;
        if response.is_success() {
            tracing::info!(
                request_id = %incoming.request_id,
                requestor = %incoming.requestor_user_name,
                "confirmed request"
            );
            return Ok(());
        }

        Err(remote_failure(&response))
    }
}
