//! Signed session tokens.
//!
//! Tokens are compact HS256 JWS strings (`header.payload.signature`, base64url
//! without padding). The payload carries the requester claims under `data`
//! plus `iat`/`exp` in seconds and a random `jti` so that two tokens minted in
//! the same second never collide.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::domain::{Role, new_id};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// `exp` has whole-second precision, so shorter lifetimes could mint a pair
/// that is already expired.
pub const MIN_LIFETIME_MS: i64 = 1_000;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Malformed token")]
    Malformed,
}

/// Identity embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterClaims {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl RequesterClaims {
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    data: RequesterClaims,
    exp: i64,
    iat: i64,
    jti: String,
}

/// Issues and verifies access/refresh pairs. Access and refresh tokens are
/// signed with different keys, so neither verifies as the other.
#[derive(Clone)]
pub struct TokenAuthority {
    access_key: Vec<u8>,
    refresh_key: Vec<u8>,
}

impl TokenAuthority {
    #[must_use]
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_key: access_secret.as_bytes().to_vec(),
            refresh_key: refresh_secret.as_bytes().to_vec(),
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.access_secret, &config.refresh_secret)
    }

    /// Mints a pair: access expires after `lifetime_ms`, refresh after 1.25x that.
    pub fn issue(
        &self,
        claims: &RequesterClaims,
        lifetime_ms: i64,
    ) -> Result<TokenPair, TokenError> {
        self.issue_at(claims, lifetime_ms, Utc::now())
    }

    pub fn issue_at(
        &self,
        claims: &RequesterClaims,
        lifetime_ms: i64,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        if lifetime_ms < MIN_LIFETIME_MS {
            return Err(TokenError::Signing(format!(
                "token lifetime must be at least {MIN_LIFETIME_MS}ms, got {lifetime_ms}ms"
            )));
        }

        let access_exp = now + Duration::milliseconds(lifetime_ms);
        let refresh_exp = now + Duration::milliseconds(lifetime_ms + lifetime_ms / 4);

        Ok(TokenPair {
            access_token: encode(&self.access_key, claims, now, access_exp)?,
            refresh_token: encode(&self.refresh_key, claims, now, refresh_exp)?,
        })
    }

    /// True iff `token` is a well-formed access token with a valid signature
    /// and an expiry in the future.
    #[must_use]
    pub fn verify(&self, token: &str) -> bool {
        self.verify_at(token, Utc::now())
    }

    #[must_use]
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        expiry(&self.access_key, token).is_some_and(|exp| exp > now.timestamp())
    }

    #[must_use]
    pub fn verify_refresh(&self, token: &str) -> bool {
        self.verify_refresh_at(token, Utc::now())
    }

    #[must_use]
    pub fn verify_refresh_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        expiry(&self.refresh_key, token).is_some_and(|exp| exp > now.timestamp())
    }

    /// Parses the claims without checking the signature. Verify first.
    pub fn decode_claims(token: &str) -> Result<RequesterClaims, TokenError> {
        let (_, payload) = token
            .rsplit_once('.')
            .and_then(|(signing_input, _)| split_signing_input(signing_input))
            .ok_or(TokenError::Malformed)?;

        decode_segment::<Payload>(payload)
            .map(|p| p.data)
            .ok_or(TokenError::Malformed)
    }
}

fn mac_for(key: &[u8]) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(key).map_err(|e| TokenError::Signing(e.to_string()))
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn encode(
    key: &[u8],
    claims: &RequesterClaims,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<String, TokenError> {
    let header = encode_segment(&Header {
        alg: ALGORITHM.to_string(),
        typ: "JWT".to_string(),
    })?;
    let payload = encode_segment(&Payload {
        data: claims.clone(),
        exp: expires_at.timestamp(),
        iat: issued_at.timestamp(),
        jti: new_id(),
    })?;

    let signing_input = format!("{header}.{payload}");
    let mut mac = mac_for(key)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// Returns `exp` for a token signed with `key`; `None` for anything malformed,
/// mis-signed or not HS256.
fn expiry(key: &[u8], token: &str) -> Option<i64> {
    let (signing_input, signature) = token.rsplit_once('.')?;
    let (header, payload) = split_signing_input(signing_input)?;

    let header: Header = decode_segment(header)?;
    if header.alg != ALGORITHM {
        return None;
    }

    let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
    let mut mac = mac_for(key).ok()?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&signature).ok()?;

    decode_segment::<Payload>(payload).map(|p| p.exp)
}

fn split_signing_input(signing_input: &str) -> Option<(&str, &str)> {
    let (header, payload) = signing_input.split_once('.')?;
    if payload.contains('.') {
        return None;
    }
    Some((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims(role: Role) -> RequesterClaims {
        RequesterClaims {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role,
        }
    }

    fn authority() -> TokenAuthority {
        TokenAuthority::new("access-secret", "refresh-secret")
    }

    #[test]
    fn test_issued_token_is_valid_until_expiry() {
        let authority = authority();
        let now = Utc::now();
        let pair = authority
            .issue_at(&claims(Role::Customer), 60_000, now)
            .unwrap();

        assert!(authority.verify_at(&pair.access_token, now));
        assert!(authority.verify_at(&pair.access_token, now + Duration::seconds(59)));
        assert!(!authority.verify_at(&pair.access_token, now + Duration::seconds(61)));
    }

    #[test]
    fn test_refresh_outlives_access() {
        let authority = authority();
        let now = Utc::now();
        let pair = authority
            .issue_at(&claims(Role::Customer), 60_000, now)
            .unwrap();

        let later = now + Duration::seconds(70);
        assert!(!authority.verify_at(&pair.access_token, later));
        assert!(authority.verify_refresh_at(&pair.refresh_token, later));
        assert!(!authority.verify_refresh_at(&pair.refresh_token, now + Duration::seconds(76)));
    }

    #[test]
    fn test_keys_are_not_interchangeable() {
        let authority = authority();
        let pair = authority.issue(&claims(Role::Customer), 60_000).unwrap();

        assert!(!authority.verify(&pair.refresh_token));
        assert!(!authority.verify_refresh(&pair.access_token));

        let other = TokenAuthority::new("someone-else", "refresh-secret");
        assert!(!other.verify(&pair.access_token));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let authority = authority();
        let pair = authority.issue(&claims(Role::Customer), 60_000).unwrap();

        let parts: Vec<&str> = pair.access_token.split('.').collect();
        let forged = encode_segment(&Payload {
            data: claims(Role::SuperAdmin),
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
            jti: "x".to_string(),
        })
        .unwrap();
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert!(!authority.verify(&tampered));
    }

    #[test]
    fn test_malformed_tokens_are_invalid() {
        let authority = authority();
        assert!(!authority.verify(""));
        assert!(!authority.verify("abc"));
        assert!(!authority.verify("a.b.c"));
        assert!(!authority.verify("a.b.c.d"));
        assert!(TokenAuthority::decode_claims("not-a-token").is_err());
    }

    #[test]
    fn test_decode_claims_round_trip() {
        let authority = authority();
        let original = claims(Role::SuperAdmin);
        let pair = authority.issue(&original, 1_000).unwrap();

        assert_eq!(TokenAuthority::decode_claims(&pair.access_token).unwrap(), original);
        assert_eq!(TokenAuthority::decode_claims(&pair.refresh_token).unwrap(), original);
    }

    #[test]
    fn test_non_positive_lifetime_rejected() {
        let authority = authority();
        assert!(matches!(
            authority.issue(&claims(Role::Customer), 0),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_sub_second_lifetime_rejected() {
        let authority = authority();
        let now = Utc.timestamp_opt(1_700_000_000, 200_000_000).unwrap();
        assert!(matches!(
            authority.issue_at(&claims(Role::Customer), 500, now),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_shortest_lifetime_valid_at_fractional_second() {
        let authority = authority();
        let now = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        let pair = authority
            .issue_at(&claims(Role::Customer), MIN_LIFETIME_MS, now)
            .unwrap();

        assert!(authority.verify_at(&pair.access_token, now));
        let expiry = now + Duration::milliseconds(MIN_LIFETIME_MS);
        assert!(!authority.verify_at(&pair.access_token, expiry));
        assert!(authority.verify_refresh_at(&pair.refresh_token, now));
    }

    #[test]
    fn test_pairs_are_unique() {
        let authority = authority();
        let now = Utc::now();
        let a = authority.issue_at(&claims(Role::Customer), 60_000, now).unwrap();
        let b = authority.issue_at(&claims(Role::Customer), 60_000, now).unwrap();
        assert_ne!(a.refresh_token, b.refresh_token);
    }
}
