//! Reconcile command handler

use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::services::{CategoryService, SeaOrmCategoryService};

pub async fn cmd_reconcile(config: &Config, category: Option<&str>) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let service = SeaOrmCategoryService::new(store);

    let Some(slug) = category else {
        let repaired = service.reconcile_all().await?;
        println!("Reconciled all categories ({repaired} repaired)");
        return Ok(());
    };

    let category = service
        .get(slug)
        .await
        .with_context(|| format!("Cannot reconcile category '{slug}'"))?;

    if service.reconcile(&category.id).await? {
        println!("✓ Repaired backlinks for '{slug}'");
    } else {
        println!("'{slug}' is already consistent");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.general.database_path = "sqlite::memory:".to_string();
        config
    }

    #[tokio::test]
    async fn test_unknown_category_is_an_error() {
        let err = cmd_reconcile(&memory_config(), Some("missing"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_reconcile_all_on_empty_store() {
        assert!(cmd_reconcile(&memory_config(), None).await.is_ok());
    }
}
