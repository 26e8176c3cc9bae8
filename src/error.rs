use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors raised while turning a private key and claims into a client secret.
///
/// Both variants are terminal for the request: malformed key material will
/// not become valid on retry, and a signing failure points at the
/// environment rather than the input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The key bytes are not a PKCS#8 P-256 private key.
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Serializing the token or computing the signature failed.
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}
