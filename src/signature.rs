//! Webhook signature verification using HMAC-SHA256.
//!
//! The SMS provider signs each delivery by computing HMAC-SHA256 over the
//! raw request body with a shared secret and sending the lowercase hex
//! digest in the `X-Signature` header (no algorithm prefix).
//!
//! Verification must run against the exact bytes that arrive on the wire,
//! before any parsing: a re-serialized body can differ byte-for-byte from
//! what the sender signed. Signature verification is the first step in
//! webhook processing; invalid signatures are rejected before parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parses a hex-encoded signature header into raw bytes.
///
/// Returns `None` for malformed headers (invalid hex, odd length).
/// Never panics.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header).ok()
}

/// Computes the HMAC-SHA256 signature of a payload using the given secret.
///
/// This is useful for testing purposes (generating expected signatures).
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as the header value the provider sends.
pub fn format_signature_header(signature: &[u8]) -> String {
    hex::encode(signature)
}

/// Verifies a webhook signature against the payload and secret.
///
/// Returns `true` if the signature is valid, `false` otherwise.
/// Uses constant-time comparison to prevent timing attacks: the running
/// time is independent of where the supplied and expected digests first
/// differ, so an attacker cannot recover the signature byte by byte.
///
/// All failure modes (malformed hex, wrong length, wrong digest) collapse
/// into `false`; callers must not distinguish them.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let supplied = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // Constant-time comparison via the HMAC library
    mac.verify_slice(&supplied).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_signature_header_valid() {
        let result = parse_signature_header("1234abcd");
        assert_eq!(result, Some(vec![0x12, 0x34, 0xab, 0xcd]));
    }

    #[test]
    fn parse_signature_header_full_length() {
        // Full SHA256 output (64 hex chars = 32 bytes)
        let header = "a".repeat(64);
        let result = parse_signature_header(&header);
        assert!(result.is_some());
        assert_eq!(result.unwrap().len(), 32);
    }

    #[test]
    fn parse_signature_header_invalid_hex() {
        assert_eq!(parse_signature_header("xyz!"), None);
    }

    #[test]
    fn parse_signature_header_odd_length() {
        assert_eq!(parse_signature_header("abc"), None);
    }

    #[test]
    fn parse_signature_header_uppercase_hex() {
        let result = parse_signature_header("ABCD1234");
        assert_eq!(result, Some(vec![0xab, 0xcd, 0x12, 0x34]));
    }

    /// Known HMAC-SHA256 test vector (RFC 2202 style).
    #[test]
    fn known_test_vector() {
        let payload = b"The quick brown fox jumps over the lazy dog";
        let secret = b"key";

        let sig = compute_signature(payload, secret);
        assert_eq!(
            hex::encode(&sig),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
        assert!(verify_signature(
            payload,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8",
            secret
        ));
    }

    #[test]
    fn verify_signature_wrong_secret() {
        let payload = b"test payload";
        let sig = compute_signature(payload, b"correct-secret");
        let header = format_signature_header(&sig);

        assert!(verify_signature(payload, &header, b"correct-secret"));
        assert!(!verify_signature(payload, &header, b"wrong-secret"));
    }

    #[test]
    fn verify_signature_modified_payload() {
        let secret = b"secret";
        let sig = compute_signature(b"original payload", secret);
        let header = format_signature_header(&sig);

        assert!(verify_signature(b"original payload", &header, secret));
        assert!(!verify_signature(b"modified payload", &header, secret));
    }

    #[test]
    fn verify_signature_malformed_header_returns_false() {
        let payload = b"test";
        let secret = b"secret";

        // Malformed headers return false rather than panicking
        assert!(!verify_signature(payload, "", secret));
        assert!(!verify_signature(payload, "not hex", secret));
        assert!(!verify_signature(payload, "sha256=abcd", secret));
        assert!(!verify_signature(payload, "zzzz", secret));
    }

    #[test]
    fn verify_signature_empty_payload() {
        let secret = b"secret";
        let sig = compute_signature(b"", secret);
        let header = format_signature_header(&sig);
        assert!(verify_signature(b"", &header, secret));
    }

    #[test]
    fn verify_signature_binary_payload() {
        let payload = &[0x00, 0x01, 0xff, 0xfe, 0x00, 0x00, 0x7f];
        let secret = b"secret";
        let sig = compute_signature(payload, secret);
        let header = format_signature_header(&sig);
        assert!(verify_signature(payload, &header, secret));
    }

    proptest! {
        /// Property: verify(payload, sign(payload, secret), secret) == true
        #[test]
        fn prop_sign_verify_roundtrip(payload: Vec<u8>, secret: Vec<u8>) {
            let sig = compute_signature(&payload, &secret);
            let header = format_signature_header(&sig);
            prop_assert!(verify_signature(&payload, &header, &secret));
        }

        /// Property: signing with one secret and verifying with another fails.
        #[test]
        fn prop_wrong_secret_fails(payload: Vec<u8>, secret1: Vec<u8>, secret2: Vec<u8>) {
            prop_assume!(secret1 != secret2);

            let sig = compute_signature(&payload, &secret1);
            let header = format_signature_header(&sig);
            prop_assert!(!verify_signature(&payload, &header, &secret2));
        }

        /// Property: any modification to the payload fails verification.
        #[test]
        fn prop_modified_payload_fails(
            original: Vec<u8>,
            modified: Vec<u8>,
            secret: Vec<u8>
        ) {
            prop_assume!(original != modified);

            let sig = compute_signature(&original, &secret);
            let header = format_signature_header(&sig);
            prop_assert!(!verify_signature(&modified, &header, &secret));
        }

        /// Property: parse(format(signature)) roundtrips.
        #[test]
        fn prop_format_parse_roundtrip(signature: [u8; 32]) {
            let header = format_signature_header(&signature);
            let parsed = parse_signature_header(&header);
            prop_assert_eq!(parsed, Some(signature.to_vec()));
        }

        /// Property: signatures are always 32 bytes (SHA256 output size).
        #[test]
        fn prop_signature_length(payload: Vec<u8>, secret: Vec<u8>) {
            let sig = compute_signature(&payload, &secret);
            prop_assert_eq!(sig.len(), 32);
        }

        /// Property: malformed headers never cause a panic.
        #[test]
        fn prop_malformed_header_no_panic(header: String, payload: Vec<u8>, secret: Vec<u8>) {
            let _ = parse_signature_header(&header);
            let _ = verify_signature(&payload, &header, &secret);
        }
    }
}
