//! Automatic approval of incoming requests from allow-listed requestors

use std::collections::HashSet;
use std::convert::Infallible;
use std::str::FromStr;

use crate::protocol::IncomingRequest;
use crate::session::Session;
use crate::VaultError;

/// Requestor identities whose requests may be confirmed automatically.
///
/// Matching is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    users: HashSet<String>,
}

impl AllowList {
    /// Parse a comma-separated list, e.g. `"KEY1, key2,KEY3"`.
    ///
    /// Entries are trimmed and empty entries are dropped.
    pub fn parse(users: &str) -> Self {
        users.split(',').collect()
    }

    pub fn contains(&self, requestor: &str) -> bool {
        self.users.contains(&normalize(requestor))
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

fn normalize(user: &str) -> String {
    user.trim().to_uppercase()
}

impl<S: AsRef<str>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let users = iter
            .into_iter()
            .map(|u| normalize(u.as_ref()))
            .filter(|u| !u.is_empty())
            .collect();
        Self { users }
    }
}

impl FromStr for AllowList {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// What happened to one incoming request during approval
#[derive(Debug)]
pub enum ApprovalOutcome {
    /// Requestor was allow-listed and the vault accepted the confirmation
    Confirmed,
    /// Requestor is not on the allow-list; the request was left alone
    Ignored,
    /// Requestor was allow-listed but the confirmation failed
    Failed(VaultError),
}

/// Outcome for a single incoming request
#[derive(Debug)]
pub struct Approval<'a> {
    pub request: &'a IncomingRequest,
    pub outcome: ApprovalOutcome,
}

impl Session {
    /// Confirm every request whose requestor is on `allowed`, in order.
    ///
    /// Requests from anyone else are reported as ignored. A failed
    /// confirmation does not stop the remaining requests from being handled.
    pub fn approve_matching<'a>(
        &self,
        requests: &'a [IncomingRequest],
        allowed: &AllowList,
        reason: &str,
    ) -> Vec<Approval<'a>> {
        requests
            .iter()
            .map(|request| {
                let outcome = if !allowed.contains(&request.requestor_user_name) {
                    tracing::debug!(
                        request_id = %request.request_id,
                        requestor = %request.requestor_user_name,
                        "requestor not allow-listed, ignoring"
                    );
                    ApprovalOutcome::Ignored
                } else {
                    match self.confirm(request, reason) {
                        Ok(()) => ApprovalOutcome::Confirmed,
                        Err(e) => {
                            tracing::warn!(
                                request_id = %request.request_id,
                                requestor = %request.requestor_user_name,
                                error = %e,
                                "failed to confirm request"
                            );
                            ApprovalOutcome::Failed(e)
                        }
                    }
                };
                Approval { request, outcome }
            })
            .collect()
    }
}
