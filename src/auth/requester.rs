use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use std::convert::Infallible;

use super::token::RequesterClaims;

/// The identity behind a request, absent when no token was presented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requester(Option<RequesterClaims>);

impl Requester {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }

    #[must_use]
    pub const fn authenticated(claims: RequesterClaims) -> Self {
        Self(Some(claims))
    }

    #[must_use]
    pub const fn claims(&self) -> Option<&RequesterClaims> {
        self.0.as_ref()
    }

    /// Present and `ROLE_SUPER_ADMIN`.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.0.as_ref().is_some_and(RequesterClaims::is_privileged)
    }

    /// The requester's id, or `fallback` for anonymous requests.
    #[must_use]
    pub fn id_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.0.as_ref().map_or(fallback, |c| c.id.as_str())
    }
}

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequesterClaims>()
            .cloned()
            .map_or_else(Self::anonymous, Self::authenticated))
    }
}

/// Token from `Authorization`, with or without the `Bearer ` prefix.
///
/// `Some("")` means the header was present but carried nothing usable.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?;
    let raw = value.to_str().unwrap_or_default().trim();
    Some(raw.strip_prefix("Bearer ").map_or(raw, str::trim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use axum::http::HeaderValue;

    fn claims(role: Role) -> RequesterClaims {
        RequesterClaims {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_privilege_requires_super_admin() {
        assert!(!Requester::anonymous().is_privileged());
        assert!(!Requester::authenticated(claims(Role::Customer)).is_privileged());
        assert!(Requester::authenticated(claims(Role::SuperAdmin)).is_privileged());
    }

    #[test]
    fn test_id_or_falls_back_for_anonymous() {
        assert_eq!(Requester::anonymous().id_or("anon"), "anon");
        assert_eq!(
            Requester::authenticated(claims(Role::Customer)).id_or("anon"),
            "u1"
        );
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static(""));
        assert_eq!(bearer_token(&headers), Some(""));
    }
}
