use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Audience Apple's token endpoint expects in every client secret.
pub const APPLE_AUDIENCE: &str = "https://appleid.apple.com";

/// Six months, the longest lifetime Apple accepts for a client secret.
pub const DEFAULT_VALIDITY_SECS: u64 = 15_777_000;

/// One hundred years. Any `DateTime<Utc>` timestamp plus this span still fits
/// in an `i64`, so `exp - iat` always equals the validity exactly.
pub const MAX_VALIDITY_SECS: u64 = 3_155_760_000;

/// Lifetime of a client secret, in whole seconds. Always positive, so the
/// expiration of assembled claims is strictly after their issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Validity(i64);

impl Validity {
    pub const DEFAULT: Validity = Validity(DEFAULT_VALIDITY_SECS as i64);

    /// Returns `None` for zero or for spans longer than [`MAX_VALIDITY_SECS`].
    pub fn from_secs(secs: u64) -> Option<Self> {
        if secs == 0 || secs > MAX_VALIDITY_SECS {
            return None;
        }
        i64::try_from(secs).ok().map(Self)
    }

    pub fn as_secs(&self) -> u64 {
        self.0.unsigned_abs()
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Source of the unique `jti` put into each token.
pub trait TokenIdSource {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs, hyphenated and lowercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4;

impl TokenIdSource for UuidV4 {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Header and payload values for one client secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    key_id: String,
    issuer: String,
    subject: String,
    issued_at: i64,
    expires_at: i64,
    token_id: String,
}

impl TokenClaims {
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn audience(&self) -> &'static str {
        APPLE_AUDIENCE
    }

    /// Seconds since the Unix epoch.
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// Seconds since the Unix epoch.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn issued_at_utc(&self) -> DateTime<Utc> {
        to_utc(self.issued_at)
    }

    pub fn expires_at_utc(&self) -> DateTime<Utc> {
        to_utc(self.expires_at)
    }
}

fn to_utc(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Build the claims for a client secret issued at `now`.
///
/// `now` is truncated to whole seconds. Identifiers are copied as given;
/// callers are expected to have rejected empty values.
pub fn assemble_claims(
    key_id: &str,
    issuer: &str,
    subject: &str,
    now: DateTime<Utc>,
    validity: Validity,
    ids: &dyn TokenIdSource,
) -> TokenClaims {
    let issued_at = now.timestamp();
    // Cannot overflow: |issued_at| < 2^43 and validity <= MAX_VALIDITY_SECS.
    let expires_at = issued_at + validity.0;

    TokenClaims {
        key_id: key_id.to_string(),
        issuer: issuer.to_string(),
        subject: subject.to_string(),
        issued_at,
        expires_at,
        token_id: ids.next_id(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use proptest::prelude::*;

    use super::*;

    struct Sequence(Cell<u32>);

    impl TokenIdSource for Sequence {
        fn next_id(&self) -> String {
            let n = self.0.get();
            self.0.set(n + 1);
            format!("id-{n}")
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_assemble_claims_fields() {
        let ids = Sequence(Cell::new(0));
        let claims = assemble_claims(
            "ABC123",
            "TEAM01",
            "com.example.app",
            at(1_700_000_000),
            Validity::DEFAULT,
            &ids,
        );

        assert_eq!(claims.key_id(), "ABC123");
        assert_eq!(claims.issuer(), "TEAM01");
        assert_eq!(claims.subject(), "com.example.app");
        assert_eq!(claims.audience(), "https://appleid.apple.com");
        assert_eq!(claims.issued_at(), 1_700_000_000);
        assert_eq!(claims.expires_at(), 1_715_777_000);
        assert_eq!(claims.token_id(), "id-0");
    }

    #[test]
    fn test_same_inputs_get_distinct_token_ids() {
        let now = at(1_700_000_000);
        let a = assemble_claims("K", "T", "S", now, Validity::DEFAULT, &UuidV4);
        let b = assemble_claims("K", "T", "S", now, Validity::DEFAULT, &UuidV4);

        assert_eq!(a.key_id(), b.key_id());
        assert_eq!(a.issuer(), b.issuer());
        assert_eq!(a.subject(), b.subject());
        assert_eq!(a.issued_at(), b.issued_at());
        assert_eq!(a.expires_at(), b.expires_at());
        assert_ne!(a.token_id(), b.token_id());
    }

    #[test]
    fn test_uuid_v4_format() {
        let id = UuidV4.next_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id, id.to_lowercase());
        assert_eq!(id.len(), 36);
    }

    #[test]
    fn test_now_truncated_to_seconds() {
        let now = Utc.timestamp_opt(1_700_000_000, 999_999_999).unwrap();
        let claims = assemble_claims("K", "T", "S", now, Validity::DEFAULT, &UuidV4);
        assert_eq!(claims.issued_at(), 1_700_000_000);
        assert_eq!(claims.issued_at_utc(), at(1_700_000_000));
        assert_eq!(claims.expires_at_utc(), at(1_715_777_000));
    }

    #[test]
    fn test_validity_bounds() {
        assert_eq!(Validity::from_secs(0), None);
        assert_eq!(Validity::from_secs(u64::MAX), None);
        assert_eq!(Validity::from_secs(60).map(|v| v.as_secs()), Some(60));
        assert_eq!(Validity::default().as_secs(), DEFAULT_VALIDITY_SECS);
    }

    #[test]
    fn test_validity_upper_limit() {
        assert_eq!(
            Validity::from_secs(MAX_VALIDITY_SECS).map(|v| v.as_secs()),
            Some(MAX_VALIDITY_SECS)
        );
        assert_eq!(Validity::from_secs(MAX_VALIDITY_SECS + 1), None);
        assert_eq!(Validity::from_secs(i64::MAX as u64), None);
    }

    #[test]
    fn test_longest_validity_keeps_exact_lifetime() {
        let validity = Validity::from_secs(MAX_VALIDITY_SECS).unwrap();
        for now in [DateTime::<Utc>::MIN_UTC, at(1_700_000_000), DateTime::<Utc>::MAX_UTC] {
            let claims = assemble_claims("K", "T", "S", now, validity, &UuidV4);
            assert_eq!(
                claims.expires_at() - claims.issued_at(),
                MAX_VALIDITY_SECS as i64
            );
        }

        let claims = assemble_claims("K", "T", "S", at(1_700_000_000), validity, &UuidV4);
        assert_eq!(
            claims.expires_at_utc(),
            at(1_700_000_000 + MAX_VALIDITY_SECS as i64)
        );
    }

    proptest! {
        #[test]
        fn prop_lifetime_matches_validity(
            now in 0i64..4_102_444_800,
            secs in 1u64..=DEFAULT_VALIDITY_SECS * 4,
        ) {
            let validity = Validity::from_secs(secs).unwrap();
            let claims = assemble_claims("K", "T", "S", at(now), validity, &UuidV4);
            prop_assert_eq!(claims.expires_at() - claims.issued_at(), secs as i64);
            prop_assert!(claims.expires_at() > claims.issued_at());
        }
    }
}
