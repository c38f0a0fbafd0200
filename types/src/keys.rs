//! Ledger key namespace.
//!
//! Key prefixes are a stable on-disk naming convention; changing them
//! requires a data migration.

/// Prefix for voter records, keyed by voter id.
pub const VOTER_PREFIX: &str = "voter:";
/// Prefix for citizen aliases, each a reference to a voter record.
pub const CITIZEN_PREFIX: &str = "citizen:";
/// Prefix for ballot records, keyed by ballot id.
pub const BALLOT_PREFIX: &str = "ballot:";

pub fn voter_key(voter_id: &str) -> Vec<u8> {
    format!("{VOTER_PREFIX}{voter_id}").into_bytes()
}

pub fn citizen_key(citizen_id: &str) -> Vec<u8> {
    format!("{CITIZEN_PREFIX}{citizen_id}").into_bytes()
}

pub fn ballot_key(ballot_id: &str) -> Vec<u8> {
    format!("{BALLOT_PREFIX}{ballot_id}").into_bytes()
}

/// Strip a namespace prefix from a raw ledger key, if present.
pub fn strip_prefix<'a>(key: &'a [u8], prefix: &str) -> Option<&'a str> {
    std::str::from_utf8(key).ok()?.strip_prefix(prefix)
}
