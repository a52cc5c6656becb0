//! Webhook signature validation (HMAC-SHA256, `X-Hub-Signature-256`).
//!
//! Deliveries are checked against the shared secret before anything touches
//! the body. The header carries `sha256=<hex digest>`.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Why a delivery's signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The header is not `sha256=` followed by hex.
    #[error("malformed signature header")]
    Malformed,

    /// The digest does not match the payload under our secret.
    #[error("signature does not match payload")]
    Mismatch,
}

/// The shared webhook secret.
///
/// `Debug` never prints the secret bytes.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        WebhookSecret(secret.into())
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.0).expect("HMAC can take key of any size")
    }

    /// Computes the `X-Hub-Signature-256` header value for `payload`.
    ///
    /// ```
    /// use review_plugins::webhooks::WebhookSecret;
    ///
    /// let secret = WebhookSecret::new("It's a Secret to Everybody");
    /// let header = secret.sign(b"Hello, World!");
    /// assert!(header.starts_with("sha256="));
    /// assert!(secret.verify(b"Hello, World!", &header).is_ok());
    /// assert!(secret.verify(b"Goodbye", &header).is_err());
    /// ```
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(payload);
        format!(
            "{}{}",
            SIGNATURE_PREFIX,
            hex::encode(mac.finalize().into_bytes())
        )
    }

    /// Checks a signature header against `payload`.
    ///
    /// The digest comparison is constant-time.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), SignatureError> {
        let digest = parse_signature_header(signature_header).ok_or(SignatureError::Malformed)?;
        let mut mac = self.mac();
        mac.update(payload);
        mac.verify_slice(&digest)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WebhookSecret").field(&"<redacted>").finish()
    }
}

/// Extracts the raw digest from a `sha256=<hex>` header value.
fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix(SIGNATURE_PREFIX)?;
    hex::decode(hex_sig).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_accepts_either_hex_case() {
        assert_eq!(
            parse_signature_header("sha256=ABCD1234"),
            Some(vec![0xab, 0xcd, 0x12, 0x34])
        );
        assert_eq!(
            parse_signature_header("sha256=abcd1234"),
            Some(vec![0xab, 0xcd, 0x12, 0x34])
        );
    }

    #[test]
    fn parse_rejects_other_algorithms_and_bad_hex() {
        assert_eq!(parse_signature_header("sha1=abcd"), None);
        assert_eq!(parse_signature_header("abcd1234"), None);
        assert_eq!(parse_signature_header("sha256=xyz"), None);
        assert_eq!(parse_signature_header("sha256=abc"), None);
    }

    #[test]
    fn verify_distinguishes_malformed_from_mismatch() {
        let secret = WebhookSecret::new("secret");
        assert_eq!(
            secret.verify(b"payload", "not-a-header"),
            Err(SignatureError::Malformed)
        );
        // Well-formed but empty digest.
        assert_eq!(
            secret.verify(b"payload", "sha256="),
            Err(SignatureError::Mismatch)
        );
        let other = WebhookSecret::new("other").sign(b"payload");
        assert_eq!(
            secret.verify(b"payload", &other),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn signature_header_has_64_hex_digits() {
        let header = WebhookSecret::new("").sign(b"");
        let digest = header.strip_prefix("sha256=").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_redacts_secret() {
        let secret = WebhookSecret::new("hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    proptest! {
        #[test]
        fn signed_payload_verifies(payload: Vec<u8>, secret: Vec<u8>) {
            let secret = WebhookSecret::new(secret);
            let header = secret.sign(&payload);
            prop_assert!(secret.verify(&payload, &header).is_ok());
        }

        #[test]
        fn tampered_payload_is_rejected(original: Vec<u8>, tampered: Vec<u8>, secret: Vec<u8>) {
            prop_assume!(original != tampered);
            let secret = WebhookSecret::new(secret);
            let header = secret.sign(&original);
            prop_assert_eq!(secret.verify(&tampered, &header), Err(SignatureError::Mismatch));
        }

        #[test]
        fn arbitrary_headers_never_panic(header: String, payload: Vec<u8>) {
            let _ = WebhookSecret::new("s").verify(&payload, &header);
        }
    }
}
