//! Ballot value encoding.
//!
//! A ballot is a two-byte big-endian unsigned integer. `0` is reserved as
//! the "not yet cast" sentinel; every other value is a candidate code.

/// Sentinel vote value meaning "not yet cast".
pub const UNCAST: u16 = 0;

/// Encode a vote value for storage.
pub fn encode_vote(value: u16) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode a stored ballot value. `None` if the bytes are not exactly two.
pub fn decode_vote(bytes: &[u8]) -> Option<u16> {
    let arr: [u8; 2] = bytes.try_into().ok()?;
    Some(u16::from_be_bytes(arr))
}
