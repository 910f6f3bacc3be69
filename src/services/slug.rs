//! URL slugs for categories and products.

use anyhow::Result;
use rand::Rng;
use std::future::Future;

const SUFFIX_LEN: usize = 5;
const MAX_ATTEMPTS: usize = 32;

/// Transliterates to ASCII, lowercases and joins alphanumeric runs with `-`.
///
/// ```rust
/// use store_api::services::slug::normalize;
///
/// assert_eq!(normalize("  Red Shoes!  "), "red-shoes");
/// assert_eq!(normalize("Café Crème"), "cafe-creme");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    ::slug::slugify(text)
}

/// Five random lowercase ASCII letters.
#[must_use]
pub fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

/// Finds a slug for `text` that `exists` reports as free.
///
/// Collisions get `-` plus a random suffix appended to the base slug.
/// Slugs in `keep` count as free, letting an entity retain its own slug.
pub async fn unique_slug<F, Fut>(text: &str, keep: &[&str], exists: F) -> Result<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let base = normalize(text);
    if base.is_empty() {
        anyhow::bail!("Cannot derive a slug from {text:?}");
    }

    let mut candidate = base.clone();
    for _ in 0..MAX_ATTEMPTS {
        if keep.contains(&candidate.as_str()) || !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
        candidate = format!("{base}-{}", random_suffix());
    }

    anyhow::bail!("Could not find a free slug for {text:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Shoes"), "shoes");
        assert_eq!(normalize("Red   Shoes"), "red-shoes");
        assert_eq!(normalize("--Hello, World--"), "hello-world");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_normalize_transliterates() {
        assert_eq!(normalize("Café Crème"), "cafe-creme");
        assert_eq!(normalize("Über Größe"), "uber-grosse");

        let cyrillic = normalize("Обувь");
        assert!(cyrillic.starts_with("obuv"));
        assert!(
            cyrillic
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        );
    }

    #[tokio::test]
    async fn test_non_latin_name_gets_slug() {
        let slug = unique_slug("Обувь", &[], |_| async { Ok(false) })
            .await
            .unwrap();
        assert!(slug.starts_with("obuv"));
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_free_slug_used_as_is() {
        let slug = unique_slug("Shoes", &[], |_| async { Ok(false) }).await.unwrap();
        assert_eq!(slug, "shoes");
    }

    #[tokio::test]
    async fn test_collision_appends_suffix() {
        let slug = unique_slug("Shoes", &[], |s| async move { Ok(s == "shoes") })
            .await
            .unwrap();

        let suffix = slug.strip_prefix("shoes-").unwrap();
        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_keep_list_allows_own_slug() {
        let slug = unique_slug("Shoes", &["shoes"], |_| async { Ok(true) })
            .await
            .unwrap();
        assert_eq!(slug, "shoes");
    }

    #[tokio::test]
    async fn test_empty_base_rejected() {
        assert!(unique_slug("***", &[], |_| async { Ok(false) }).await.is_err());
    }
}
