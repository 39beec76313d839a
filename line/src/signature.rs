use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify an `X-Line-Signature` header value against the raw request body.
///
/// The platform signs the body with HMAC-SHA256 keyed by the channel secret
/// and sends the digest base64-encoded. Returns false for any malformed
/// input; the comparison itself is constant-time.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let decoded = match BASE64.decode(signature) {
        Ok(decoded) => decoded,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&decoded).is_ok()
}
