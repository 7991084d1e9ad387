//! VERP bounce addressing.
//!
//! When a bounce domain is configured, each delivery gets an envelope
//! sender whose local part encodes the message id. A bounce then comes
//! back to an address that names the exact failed message, without any
//! delivery-log correlation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::EmailError;

/// Bounce address for a message id: URL-safe Base64 local part, no
/// padding, at the bounce domain.
pub fn encode_bounce_address(message_id: &str, bounce_domain: &str) -> String {
    format!("{}@{}", URL_SAFE_NO_PAD.encode(message_id), bounce_domain)
}

/// Recovers the message id from a bounce destination address.
pub fn decode_bounce_address(address: &str) -> Result<String, EmailError> {
    let local = address.split('@').next().unwrap_or(address);
    let decoded = URL_SAFE_NO_PAD.decode(local).map_err(|err| {
        EmailError::InvalidAddress {
            address: address.to_string(),
            reason: format!("local part is not VERP Base64: {err}"),
        }
    })?;
    String::from_utf8(decoded).map_err(|err| EmailError::InvalidAddress {
        address: address.to_string(),
        reason: format!("decoded message id is not UTF-8: {err}"),
    })
}
