//! Domain primitives shared by the store, services and HTTP layer.
//!
//! Roles and token kinds are stored as their wire strings so that the
//! persisted value and the JSON value never diverge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generates a new opaque identifier (32 lowercase hex characters).
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Access level of an identity.
///
/// # Examples
///
/// ```rust
/// use store_api::domain::Role;
///
/// let role: Role = "ROLE_SUPER_ADMIN".parse().unwrap();
/// assert!(role.is_privileged());
/// assert_eq!(Role::Customer.as_str(), "ROLE_CUSTOMER");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    #[serde(rename = "ROLE_CUSTOMER")]
    Customer,

    #[serde(rename = "ROLE_SUPER_ADMIN")]
    SuperAdmin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "ROLE_CUSTOMER",
            Self::SuperAdmin => "ROLE_SUPER_ADMIN",
        }
    }

    /// Whether writes from this role are persisted.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_CUSTOMER" => Ok(Self::Customer),
            "ROLE_SUPER_ADMIN" => Ok(Self::SuperAdmin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Kind of a persisted token record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "REFRESH_TOKEN")]
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Refresh => "REFRESH_TOKEN",
        }
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const MAX_LIMIT: u64 = 100;
    /// Keeps `offset` within SQLite's signed 64-bit range at any allowed limit.
    pub const MAX_PAGE: u64 = i64::MAX as u64 / Self::MAX_LIMIT;

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub current_page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_elements: u64,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
}

impl PageMetadata {
    /// `next_page` and `prev_page` are only set when they name an existing page.
    #[must_use]
    pub const fn new(request: PageRequest, total_elements: u64) -> Self {
        let total_pages = if request.limit == 0 {
            0
        } else {
            total_elements.div_ceil(request.limit)
        };
        let page = request.page;

        let next_page = if page < total_pages {
            Some(page + 1)
        } else {
            None
        };
        let prev_page = if page > 1 && page - 1 <= total_pages {
            Some(page - 1)
        } else {
            None
        };

        Self {
            current_page: page,
            per_page: request.limit,
            total_pages,
            total_elements,
            next_page,
            prev_page,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub metadata: PageMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_strings() {
        assert_eq!("ROLE_CUSTOMER".parse::<Role>().unwrap(), Role::Customer);
        assert!("ROLE_ROOT".parse::<Role>().is_err());
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"ROLE_SUPER_ADMIN\""
        );
        assert!(!Role::Customer.is_privileged());
    }

    #[test]
    fn test_new_id_shape() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_id());
    }

    #[test]
    fn test_page_metadata_middle_page() {
        let meta = PageMetadata::new(PageRequest { page: 2, limit: 10 }, 25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.next_page, Some(3));
        assert_eq!(meta.prev_page, Some(1));
    }

    #[test]
    fn test_page_metadata_bounds() {
        let first = PageMetadata::new(PageRequest { page: 1, limit: 10 }, 10);
        assert_eq!(first.total_pages, 1);
        assert_eq!(first.next_page, None);
        assert_eq!(first.prev_page, None);

        let empty = PageMetadata::new(PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.next_page, None);

        let beyond = PageMetadata::new(PageRequest { page: 9, limit: 10 }, 15);
        assert_eq!(beyond.next_page, None);
        assert_eq!(beyond.prev_page, None);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(PageRequest { page: 3, limit: 20 }.offset(), 40);
        assert_eq!(PageRequest { page: 0, limit: 20 }.offset(), 0);
        assert_eq!(
            PageRequest {
                page: u64::MAX,
                limit: PageRequest::MAX_LIMIT
            }
            .offset(),
            u64::MAX
        );

        let last = PageRequest {
            page: PageRequest::MAX_PAGE,
            limit: PageRequest::MAX_LIMIT,
        };
        assert!(last.offset() <= i64::MAX as u64);
    }
}
