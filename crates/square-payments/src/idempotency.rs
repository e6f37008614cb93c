//! Idempotency keys
//!
//! Keys are built only from identifiers that stay the same when the host
//! retries a logical operation, so Square deduplicates the retry instead of
//! charging or refunding twice.

use std::fmt;

use sha2::{Digest, Sha256};

/// Longest key Square accepts
pub const MAX_KEY_LEN: usize = 45;

/// Bytes of the token/amount digest kept in authorization keys
const ATTEMPT_DIGEST_BYTES: usize = 4;

/// Deduplication token sent with a Square request
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Key for authorizing the payment of an order
    ///
    /// The attempt digest covers the card token and amount, so a new card or
    /// a changed amount is a new attempt while a plain retry is not.
    pub fn for_authorization(order_code: &str, source_id: &str, amount: i64) -> Self {
        let attempt = Sha256::digest(format!("{source_id}:{amount}").as_bytes());
        let attempt = hex::encode(&attempt[..ATTEMPT_DIGEST_BYTES]);
        Self::from_parts(&[order_code, "create", attempt.as_str()])
    }

    /// Key for one host refund against a payment
    pub fn for_refund(payment_id: &str, refund_id: &str) -> Self {
        Self::from_parts(&[payment_id, "refund", refund_id])
    }

    fn from_parts(parts: &[&str]) -> Self {
        let raw = parts.join("-");
        if raw.len() <= MAX_KEY_LEN {
            return Self(raw);
        }

        let digest = hex::encode(Sha256::digest(raw.as_bytes()));
        Self(digest[..MAX_KEY_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
