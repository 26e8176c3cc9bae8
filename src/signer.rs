use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::Signature;
use serde::Serialize;

use crate::claims::TokenClaims;
use crate::error::{Result, TokenError};
use crate::key::KeyMaterial;

const ALGORITHM: &str = "ES256";

#[derive(Serialize)]
struct Header<'a> {
    alg: &'static str,
    kid: &'a str,
}

#[derive(Serialize)]
struct Payload<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
    sub: &'a str,
    jti: &'a str,
}

/// A compact-serialized JWS: `header.payload.signature`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken(String);

impl SignedToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The encoded header, payload and signature segments.
    pub fn segments(&self) -> (&str, &str, &str) {
        let mut parts = self.0.splitn(3, '.');
        let header = parts.next().unwrap_or_default();
        let payload = parts.next().unwrap_or_default();
        let signature = parts.next().unwrap_or_default();
        (header, payload, signature)
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn encode_segment<T: Serialize>(value: &T, what: &str) -> Result<String> {
    let json = serde_json::to_vec(value)
        .map_err(|e| TokenError::SigningFailed(format!("Failed to serialize {what}: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Sign `claims` with ES256, producing the token Apple expects as a
/// `client_secret`.
///
/// The signature is the fixed-width `r || s` form (64 bytes for P-256), not
/// DER.
pub fn sign(key: &KeyMaterial, claims: &TokenClaims) -> Result<SignedToken> {
    let header = Header {
        alg: ALGORITHM,
        kid: claims.key_id(),
    };
    let payload = Payload {
        iss: claims.issuer(),
        iat: claims.issued_at(),
        exp: claims.expires_at(),
        aud: claims.audience(),
        sub: claims.subject(),
        jti: claims.token_id(),
    };

    let mut token = encode_segment(&header, "header")?;
    token.push('.');
    token.push_str(&encode_segment(&payload, "payload")?);

    let signature: Signature = key
        .signing_key()
        .try_sign(token.as_bytes())
        .map_err(|e| TokenError::SigningFailed(format!("ECDSA signing error: {e}")))?;

    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(signature.to_bytes()));

    Ok(SignedToken(token))
}
