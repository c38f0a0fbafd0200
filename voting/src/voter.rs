//! Voter records and registration input validation.

use crate::error::VotingError;
use serde::{Deserialize, Serialize};
use verivote_types::Timestamp;

/// The voter record stored under `voter:<id>`, serialized as JSON.
///
/// `approved_at` and `voted_at` start unset; each is set exactly once, and
/// `voted_at` only together with the paired ballot write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub citizen_id: String,
    pub name: String,
    pub address: String,
    pub email: String,
    pub registered_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voted_at: Option<Timestamp>,
}

/// Input to voter registration.
#[derive(Clone, Debug, Deserialize)]
pub struct RegisterRequest {
    pub citizen_id: String,
    pub name: String,
    pub address: String,
    pub email: String,
}

impl RegisterRequest {
    /// Check every field and report all violations at once.
    pub fn validate(&self) -> Result<(), VotingError> {
        let mut violations = Vec::new();
        if self.citizen_id.trim().is_empty() {
            violations.push("citizen_id is required".to_string());
        }
        if self.name.trim().is_empty() {
            violations.push("name is required".to_string());
        }
        if self.address.trim().is_empty() {
            violations.push("address is required".to_string());
        }
        if self.email.trim().is_empty() {
            violations.push("email is required".to_string());
        } else if !plausible_email(&self.email) {
            violations.push(format!("email {:?} is not a valid address", self.email));
        }
        VotingError::from_violations(violations)
    }
}

/// Structural email check: one `@`, non-empty local part, and a domain with
/// an interior dot.
fn plausible_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = match parts.next() {
        Some(d) => d,
        None => return false,
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'),
        None => false,
    }
}
