//! Cryptographic utilities for webhook verification.
//!
//! Paddle signs each webhook with a `paddle-signature` header of the form
//! `ts=<unix seconds>;h1=<hex hmac>`. The HMAC-SHA256 is computed over
//! `"{ts}:{raw body}"` with the notification destination's secret key.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Why a webhook signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Header is missing a `ts` or `h1` component, or `ts` is not a number.
    #[error("malformed signature header")]
    Malformed,

    /// No `h1` value matches the computed HMAC.
    #[error("signature mismatch")]
    Mismatch,

    /// Timestamp is outside the configured tolerance.
    #[error("signature timestamp outside tolerance")]
    Expired,
}

/// Parsed `paddle-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
    /// The `ts` value as sent.
    pub timestamp: &'a str,
    /// Every `h1` value, in order.
    pub signatures: Vec<&'a str>,
}

impl<'a> SignatureHeader<'a> {
    /// Parse `ts=...;h1=...[;h1=...]`.
    pub fn parse(header: &'a str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(';') {
            match part.trim().split_once('=') {
                Some(("ts", ts)) => timestamp = Some(ts),
                Some(("h1", sig)) => signatures.push(sig),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
        if signatures.is_empty() || timestamp.parse::<i64>().is_err() {
            return Err(SignatureError::Malformed);
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verify a Paddle webhook signature against the raw request body.
///
/// When `tolerance_seconds` is set, `now_unix` must lie within that many
/// seconds of the signed timestamp.
pub fn verify_paddle_signature(
    secret: &str,
    header: &str,
    body: &str,
    tolerance_seconds: Option<u64>,
    now_unix: i64,
) -> Result<(), SignatureError> {
    let parsed = SignatureHeader::parse(header)?;

    if let Some(tolerance) = tolerance_seconds {
        let ts: i64 = parsed
            .timestamp
            .parse()
            .map_err(|_| SignatureError::Malformed)?;
        if now_unix.abs_diff(ts) > tolerance {
            return Err(SignatureError::Expired);
        }
    }

    let expected = hmac_sha256_hex(secret, &format!("{}:{body}", parsed.timestamp));

    if parsed
        .signatures
        .iter()
        .any(|sig| constant_time_eq(&expected, sig))
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Compute HMAC-SHA256 and return hex-encoded result.
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "pdl_ntfset_secret";
    const BODY: &str = r#"{"event_type":"transaction.completed"}"#;

    fn header_for(ts: i64, body: &str) -> String {
        format!("ts={ts};h1={}", hmac_sha256_hex(SECRET, &format!("{ts}:{body}")))
    }

    #[test]
    fn valid_signature_is_accepted() {
        let header = header_for(1_700_000_000, BODY);
        assert_eq!(
            verify_paddle_signature(SECRET, &header, BODY, None, 1_700_000_000),
            Ok(())
        );
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = header_for(1_700_000_000, BODY);
        let tampered = BODY.replace("completed", "payment_failed");
        assert_eq!(
            verify_paddle_signature(SECRET, &header, &tampered, None, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn any_matching_h1_is_enough() {
        let good = header_for(42, BODY);
        let good_sig = good.split("h1=").nth(1).unwrap();
        let header = format!("ts=42;h1=deadbeef;h1={good_sig}");
        assert!(verify_paddle_signature(SECRET, &header, BODY, None, 42).is_ok());
    }

    #[test]
    fn stale_timestamp_is_rejected_only_with_tolerance() {
        let header = header_for(1_000, BODY);
        assert!(verify_paddle_signature(SECRET, &header, BODY, None, 1_000_000).is_ok());
        assert_eq!(
            verify_paddle_signature(SECRET, &header, BODY, Some(5), 1_000_000),
            Err(SignatureError::Expired)
        );
        assert!(verify_paddle_signature(SECRET, &header, BODY, Some(5), 1_004).is_ok());
    }

    #[test]
    fn malformed_headers() {
        assert_eq!(SignatureHeader::parse("h1=abc"), Err(SignatureError::Malformed));
        assert_eq!(SignatureHeader::parse("ts=123"), Err(SignatureError::Malformed));
        assert_eq!(SignatureHeader::parse("ts=abc;h1=00"), Err(SignatureError::Malformed));
        assert_eq!(
            SignatureHeader::parse("ts=1;h1=a;h1=b").unwrap().signatures,
            vec!["a", "b"]
        );
    }

    #[test]
    fn constant_time_eq_different_strings() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
    }
}
