use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::OnceLock;

use super::ApiError;
use crate::domain::PageRequest;

pub fn require<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<String, ApiError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex")
    });

    let email = require(email, "email")?;
    if !re.is_match(email) {
        return Err(ApiError::validation("email is not valid"));
    }
    Ok(email.to_string())
}

/// Phone numbers are 9 to 11 digits.
pub fn validate_number(number: Option<String>) -> Result<Option<String>, ApiError> {
    let Some(number) = number else {
        return Ok(None);
    };

    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation("number must contain only digits"));
    }
    if !(9..=11).contains(&number.len()) {
        return Err(ApiError::validation("number must be 9 to 11 digits"));
    }
    Ok(Some(number))
}

pub fn validate_price(price: i64) -> Result<i64, ApiError> {
    if price < 0 {
        return Err(ApiError::validation("price must not be negative"));
    }
    Ok(price)
}

/// Missing values fall back to page 1 and the default limit.
pub fn validate_page(page: Option<u64>, limit: Option<u64>) -> Result<PageRequest, ApiError> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(PageRequest::DEFAULT_LIMIT);

    if page == 0 {
        return Err(ApiError::validation("page must be at least 1"));
    }
    if page > PageRequest::MAX_PAGE {
        return Err(ApiError::validation(format!(
            "page must be at most {}",
            PageRequest::MAX_PAGE
        )));
    }
    if !(1..=PageRequest::MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "limit must be between 1 and {}",
            PageRequest::MAX_LIMIT
        )));
    }
    Ok(PageRequest { page, limit })
}

/// Accepts phone numbers sent either as JSON numbers or strings.
pub fn phone_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s.trim().to_string(),
    }))
}
