//! # Wire Signatures
//!
//! The gateway authenticates every request and callback with an HMAC-MD5
//! hex digest over the relevant fields joined with `;`, keyed by the shared
//! secret. Field order matters and the remote side verifies the digest
//! bit-for-bit, so this is a wire-protocol contract, not an internal hash.

/// HMAC-MD5 hex digest over `fields` joined with `;`
pub fn generate_signature(secret: &str, fields: &[&str]) -> String {
    use hmac::{Hmac, Mac};
    use md5::Md5;

    type HmacMd5 = Hmac<Md5>;

    let message = fields.join(";");
    let mut mac =
        HmacMd5::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time equality for hex digests
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic() {
        let fields = [
            "m1",
            "shop.example",
            "DH1234567890",
            "1700000000",
            "150.00",
            "UAH",
        ];
        let first = generate_signature("s3cret", &fields);
        let second = generate_signature("s3cret", &fields);

        assert_eq!(first, second);
        // MD5 digest renders as 32 hex chars
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_field_order_matters() {
        let a = generate_signature("s3cret", &["m1", "DH1"]);
        let b = generate_signature("s3cret", &["DH1", "m1"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_matters() {
        let a = generate_signature("key-a", &["m1", "DH1"]);
        let b = generate_signature("key-b", &["m1", "DH1"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_joining_is_not_concatenation() {
        // ["ab", "c"] and ["a", "bc"] must not collide
        let a = generate_signature("s3cret", &["ab", "c"]);
        let b = generate_signature("s3cret", &["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
