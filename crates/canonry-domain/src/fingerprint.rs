//! Fingerprints for exact and cross-document identity matching

use crate::DocumentId;
use sha2::{Digest, Sha256};

/// Normalize claim text for identity comparison: trimmed and lower-cased
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Hash of document + text + scope, used for exact dedup within a document
pub fn claim_fingerprint(document_id: &DocumentId, text: &str, scope_key: &str) -> String {
    digest(&[document_id.as_str(), &normalize_text(text), scope_key])
}

/// Hash of text + scope only, used for cross-document matching
///
/// Independent of the document id by construction.
pub fn content_fingerprint(text: &str, scope_key: &str) -> String {
    digest(&[&normalize_text(text), scope_key])
}

/// Full SHA-256 of the parts, separated by a unit separator, hex encoded
pub(crate) fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// First 16 hex chars of the SHA-256 of `input`
pub(crate) fn short_digest(input: &str) -> String {
    let mut full = digest(&[input]);
    full.truncate(16);
    full
}

/// First 16 bytes of the SHA-256 of the parts, as a u128
pub(crate) fn digest_u128(parts: &[&str]) -> u128 {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(part.as_bytes());
    }
    let bytes = hasher.finalize();
    let mut arr = [0u8; 16];
    arr.copy_from_slice(&bytes[..16]);
    u128::from_be_bytes(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  TLS 1.2 is Supported "), "tls 1.2 is supported");
    }

    #[test]
    fn test_claim_fingerprint_depends_on_document() {
        let d1 = DocumentId::new("doc-1").unwrap();
        let d2 = DocumentId::new("doc-2").unwrap();
        assert_ne!(
            claim_fingerprint(&d1, "x", "global"),
            claim_fingerprint(&d2, "x", "global")
        );
    }

    #[test]
    fn test_content_fingerprint_ignores_case_and_padding() {
        assert_eq!(
            content_fingerprint("TLS 1.2 is supported", "global"),
            content_fingerprint("tls 1.2 is supported ", "global")
        );
        assert_ne!(
            content_fingerprint("TLS 1.2 is supported", "global"),
            content_fingerprint("TLS 1.2 is supported", "abc")
        );
    }

    #[test]
    fn test_separator_prevents_concatenation_collisions() {
        assert_ne!(digest(&["ab", "c"]), digest(&["a", "bc"]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: identical normalized text and scope key give identical
        /// content fingerprints whatever the document
        #[test]
        fn test_content_fingerprint_document_independent(
            text in "[A-Za-z0-9 .%]{1,60}",
            pad_left in " {0,3}",
            pad_right in " {0,3}",
            scope in "[a-f0-9]{16}",
        ) {
            let padded = format!("{}{}{}", pad_left, text.to_uppercase(), pad_right);
            prop_assert_eq!(
                content_fingerprint(&text, &scope),
                content_fingerprint(&padded, &scope)
            );
        }
    }
}
