//! Content-derived record identifiers.
//!
//! The preimage is the UTF-8 concatenation of
//! `filename, model, dataset, prompt, creator, nonce`, in that order, joined
//! by the ASCII unit separator (`0x1F`). The identifier is the lowercase hex
//! encoding of its SHA3-256 digest.
//!
//! Callers resubmitting identical content must supply a fresh nonce,
//! otherwise the registry will see the same id twice and reject the upload.

use chrono::Utc;
use sha3::{Digest, Sha3_256};

use crate::record::{Principal, RecordId};

/// Separator placed between preimage fields.
pub const FIELD_SEPARATOR: u8 = 0x1F;

/// Per-submission uniqueness input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Nonce from the current wall clock, in milliseconds since the epoch.
    pub fn from_clock() -> Self {
        Self(Utc::now().timestamp_millis().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derive the identifier of a record from its content and a nonce.
pub fn derive_id(
    filename: &str,
    model: &str,
    dataset: &str,
    prompt: &str,
    creator: &Principal,
    nonce: &Nonce,
) -> RecordId {
    let mut hasher = Sha3_256::new();
    let fields = [
        filename,
        model,
        dataset,
        prompt,
        creator.as_str(),
        nonce.as_str(),
    ];
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update([FIELD_SEPARATOR]);
        }
        hasher.update(field.as_bytes());
    }
    RecordId::new(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator() -> Principal {
        Principal::new("2vxsx-fae")
    }

    #[test]
    fn test_derive_id_deterministic() {
        let nonce = Nonce::new("1700000000000");
        let a = derive_id("x.txt", "GPT-4", "COCO", "a cat", &creator(), &nonce);
        let b = derive_id("x.txt", "GPT-4", "COCO", "a cat", &creator(), &nonce);
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_id_is_lowercase_hex_256() {
        let id = derive_id("x.txt", "m", "d", "", &creator(), &Nonce::new("0"));
        assert_eq!(id.as_str().len(), 64);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_derive_id_matches_reference_digest() {
        let id = derive_id("f", "m", "d", "p", &Principal::new("c"), &Nonce::new("n"));
        let expected = hex::encode(Sha3_256::digest(b"f\x1fm\x1fd\x1fp\x1fc\x1fn"));
        assert_eq!(id.as_str(), expected);
    }

    #[test]
    fn test_distinct_nonces_give_distinct_ids() {
        let ids: std::collections::HashSet<_> = (0..64)
            .map(|n| {
                derive_id(
                    "x.txt",
                    "GPT-4",
                    "COCO",
                    "",
                    &creator(),
                    &Nonce::new(n.to_string()),
                )
            })
            .collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn test_field_boundaries_are_not_ambiguous() {
        let nonce = Nonce::new("0");
        let a = derive_id("a-b", "c", "d", "", &creator(), &nonce);
        let b = derive_id("a", "b-c", "d", "", &creator(), &nonce);
        assert_ne!(a, b);
    }

    #[test]
    fn test_creator_changes_id() {
        let nonce = Nonce::new("0");
        let a = derive_id("f", "m", "d", "", &Principal::new("alice"), &nonce);
        let b = derive_id("f", "m", "d", "", &Principal::new("bob"), &nonce);
        assert_ne!(a, b);
    }
}
