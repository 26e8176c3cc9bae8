use chrono::{DateTime, Utc};

use crate::claims::{assemble_claims, TokenIdSource, Validity};
use crate::error::Result;
use crate::key::load_key;
use crate::signer::{sign, SignedToken};

/// Everything needed to produce one Sign in with Apple client secret.
#[derive(Clone)]
pub struct ClientSecretRequest {
    pub key_id: String,
    pub team_id: String,
    pub client_id: String,
    /// Contents of the `.p8` key file.
    pub key_pem: Vec<u8>,
    pub validity: Validity,
}

impl std::fmt::Debug for ClientSecretRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretRequest")
            .field("key_id", &self.key_id)
            .field("team_id", &self.team_id)
            .field("client_id", &self.client_id)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub token: SignedToken,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Load the key, assemble the claims and sign them.
pub fn generate_client_secret(
    request: &ClientSecretRequest,
    now: DateTime<Utc>,
    ids: &dyn TokenIdSource,
) -> Result<ClientSecret> {
    tracing::debug!(
        kid = %request.key_id,
        iss = %request.team_id,
        sub = %request.client_id,
        validity_secs = request.validity.as_secs(),
        "Generating client secret"
    );

    let key = load_key(&request.key_pem).inspect_err(|e| {
        tracing::warn!(error = %e, kid = %request.key_id, "Failed to load private key");
    })?;

    let claims = assemble_claims(
        &request.key_id,
        &request.team_id,
        &request.client_id,
        now,
        request.validity,
        ids,
    );

    let token = sign(&key, &claims).inspect_err(|e| {
        tracing::warn!(error = %e, kid = %request.key_id, "Failed to sign client secret");
    })?;

    tracing::info!(
        kid = %claims.key_id(),
        iss = %claims.issuer(),
        sub = %claims.subject(),
        jti = %claims.token_id(),
        exp = claims.expires_at(),
        "Client secret generated"
    );

    Ok(ClientSecret {
        token,
        issued_at: claims.issued_at_utc(),
        expires_at: claims.expires_at_utc(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::claims::UuidV4;
    use crate::error::TokenError;

    const P256_PEM: &str = include_str!("../tests/fixtures/p256_pkcs8.pem");

    fn request(key_pem: &[u8]) -> ClientSecretRequest {
        ClientSecretRequest {
            key_id: "ABC123".to_string(),
            team_id: "TEAM01".to_string(),
            client_id: "com.example.app".to_string(),
            key_pem: key_pem.to_vec(),
            validity: Validity::DEFAULT,
        }
    }

    #[test]
    fn test_generate_client_secret() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let secret = generate_client_secret(&request(P256_PEM.as_bytes()), now, &UuidV4).unwrap();

        assert_eq!(secret.issued_at, now);
        assert_eq!(
            secret.expires_at,
            Utc.timestamp_opt(1_715_777_000, 0).unwrap()
        );
        assert_eq!(secret.token.as_str().split('.').count(), 3);
    }

    #[test]
    fn test_custom_validity() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut req = request(P256_PEM.as_bytes());
        req.validity = Validity::from_secs(3600).unwrap();

        let secret = generate_client_secret(&req, now, &UuidV4).unwrap();
        assert_eq!((secret.expires_at - secret.issued_at).num_seconds(), 3600);
    }

    #[test]
    fn test_invalid_key_returns_no_token() {
        let result = generate_client_secret(&request(b"garbage"), Utc::now(), &UuidV4);
        assert!(matches!(result, Err(TokenError::InvalidKeyFormat(_))));
    }

    #[test]
    fn test_debug_omits_key_bytes() {
        let debug = format!("{:?}", request(P256_PEM.as_bytes()));
        assert!(debug.contains("ABC123"));
        assert!(!debug.contains("PRIVATE KEY"));
    }
}
