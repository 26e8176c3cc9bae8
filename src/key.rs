use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;

use crate::error::{Result, TokenError};

/// A P-256 private key ready to sign one client secret.
///
/// The wrapped key is zeroized when dropped and never shows up in `Debug`
/// output.
pub struct KeyMaterial {
    signing_key: SigningKey,
}

impl KeyMaterial {
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Public half of the key, for checking signatures produced with it.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("curve", &"P-256")
            .finish_non_exhaustive()
    }
}

/// Decode a PEM-armored PKCS#8 P-256 private key (the `.p8` file Apple hands
/// out) into a signing key.
pub fn load_key(pem: &[u8]) -> Result<KeyMaterial> {
    let text = std::str::from_utf8(pem)
        .map_err(|e| TokenError::InvalidKeyFormat(format!("key is not valid UTF-8: {e}")))?;

    let body: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .collect();

    if body.is_empty() {
        return Err(TokenError::InvalidKeyFormat(
            "no key material found".to_string(),
        ));
    }

    let der = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| TokenError::InvalidKeyFormat(format!("invalid base64 body: {e}")))?;

    let signing_key = SigningKey::from_pkcs8_der(&der).map_err(|e| {
        TokenError::InvalidKeyFormat(format!("not a PKCS#8 P-256 private key: {e}"))
    })?;

    Ok(KeyMaterial { signing_key })
}
