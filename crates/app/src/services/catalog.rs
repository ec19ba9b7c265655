use std::sync::Arc;

use tracing::instrument;

use pharmabill_catalog::{CatalogItem, CatalogItemDetails, PICKER_RESULT_LIMIT};
use pharmabill_core::CatalogItemId;
use pharmabill_infra::CatalogRepository;

use crate::errors::{ServiceError, ServiceResult};

/// Catalog screen operations: add, edit, delete, list and search medicines.
#[derive(Debug)]
pub struct CatalogService<S> {
    store: Arc<S>,
}

impl<S> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> CatalogService<S>
where
    S: CatalogRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(name = %details.name), err)]
    pub async fn create(&self, details: CatalogItemDetails) -> ServiceResult<CatalogItem> {
        let item = CatalogItem::create(CatalogItemId::new(), details)?;
        self.store.insert_item(&item).await?;
        tracing::info!(item_id = %item.id_typed(), "catalog item created");
        Ok(item)
    }

    #[instrument(skip(self, details), err)]
    pub async fn update(
        &self,
        id: CatalogItemId,
        details: CatalogItemDetails,
    ) -> ServiceResult<CatalogItem> {
        let mut item = self.require(id).await?;
        item.update(details)?;
        self.store.update_item(&item).await?;
        tracing::info!(item_id = %id, "catalog item updated");
        Ok(item)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: CatalogItemId) -> ServiceResult<()> {
        self.store.delete_item(id).await?;
        tracing::info!(item_id = %id, "catalog item deleted");
        Ok(())
    }

    pub async fn get(&self, id: CatalogItemId) -> ServiceResult<Option<CatalogItem>> {
        Ok(self.store.get_item(id).await?)
    }

    pub async fn require(&self, id: CatalogItemId) -> ServiceResult<CatalogItem> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("catalog item {id}")))
    }

    /// All items ordered by name, filtered by name / batch / HSN when `query` is non-empty.
    pub async fn search(&self, query: &str) -> ServiceResult<Vec<CatalogItem>> {
        Ok(self.store.search_items(query).await?)
    }

    /// Billing picker results for `query` (name only, capped).
    pub async fn pick(&self, query: &str) -> ServiceResult<Vec<CatalogItem>> {
        Ok(self.store.pick_items(query, PICKER_RESULT_LIMIT).await?)
    }

    pub async fn low_stock(&self, threshold: i64) -> ServiceResult<Vec<CatalogItem>> {
        let mut items = self.store.list_items().await?;
        items.retain(|item| item.is_low_stock(threshold));
        Ok(items)
    }
}
