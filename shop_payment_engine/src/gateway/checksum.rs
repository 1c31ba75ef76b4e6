use log::*;
use sha2::{Digest, Sha256};
use spg_common::Secret;

use crate::gateway::GatewayParams;

/// The form field that carries the checksum.
pub const CHECK_MAC_FIELD: &str = "CheckMacValue";

/// Characters that the gateway leaves unescaped, even though a form encoder escapes them.
const RESTORED_CHARACTERS: [(&str, &str); 7] =
    [("%2d", "-"), ("%5f", "_"), ("%2e", "."), ("%21", "!"), ("%2a", "*"), ("%28", "("), ("%29", ")")];

/// Computes and checks the ECPay `CheckMacValue` (SHA-256 variant, `EncryptType=1`).
///
/// The checksum does not depend on the order in which fields were supplied, and never includes the `CheckMacValue`
/// field itself, so the same codec signs outgoing requests and verifies incoming notifications.
#[derive(Debug, Clone)]
pub struct CheckMacCodec {
    hash_key: Secret<String>,
    hash_iv: Secret<String>,
}

impl CheckMacCodec {
    pub fn new(hash_key: Secret<String>, hash_iv: Secret<String>) -> Self {
        Self { hash_key, hash_iv }
    }

    /// Returns the upper-case hex checksum for the parameter set. Any existing `CheckMacValue` is ignored.
    pub fn sign(&self, params: &GatewayParams) -> String {
        let encoded = self.canonical_string(params);
        format!("{:X}", Sha256::digest(encoded.as_bytes()))
    }

    /// Signs the parameter set and stores the result in its `CheckMacValue` field.
    pub fn sign_in_place(&self, params: &mut GatewayParams) {
        let check_mac = self.sign(params);
        params.insert(CHECK_MAC_FIELD, check_mac);
    }

    /// Checks the `CheckMacValue` field against the checksum of the remaining fields. A missing or empty
    /// `CheckMacValue` never verifies.
    pub fn verify(&self, params: &GatewayParams) -> bool {
        let received = match params.get(CHECK_MAC_FIELD) {
            Some(v) if !v.is_empty() => v,
            _ => {
                debug!("🔐️ Parameter set has no {CHECK_MAC_FIELD}");
                return false;
            },
        };
        let expected = self.sign(params);
        if received == expected {
            true
        } else {
            debug!("🔐️ {CHECK_MAC_FIELD} mismatch. Received {received}, expected {expected}");
            false
        }
    }

    /// The string that is hashed: the sorted fields wrapped in the hash key and IV, form-encoded and lower-cased,
    /// with the gateway's set of literal characters restored.
    pub fn canonical_string(&self, params: &GatewayParams) -> String {
        let joined = params
            .iter()
            .filter(|(k, _)| *k != CHECK_MAC_FIELD)
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let raw = format!("HashKey={}&{joined}&HashIV={}", self.hash_key.reveal(), self.hash_iv.reveal());
        let mut encoded = urlencoding::encode(&raw).replace("%20", "+").to_lowercase();
        for (escaped, literal) in RESTORED_CHARACTERS {
            encoded = encoded.replace(escaped, literal);
        }
        encoded
    }
}
