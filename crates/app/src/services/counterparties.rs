use std::sync::Arc;

use tracing::instrument;

use pharmabill_core::CounterpartyId;
use pharmabill_infra::CounterpartyRepository;
use pharmabill_parties::{Counterparty, CounterpartyDetails};

use crate::errors::{ServiceError, ServiceResult};

/// Party directory operations.
#[derive(Debug)]
pub struct CounterpartyService<S> {
    store: Arc<S>,
}

impl<S> Clone for CounterpartyService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> CounterpartyService<S>
where
    S: CounterpartyRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(name = %details.name), err)]
    pub async fn create(&self, details: CounterpartyDetails) -> ServiceResult<Counterparty> {
        let counterparty = Counterparty::create(CounterpartyId::new(), details)?;
        self.store.insert_counterparty(&counterparty).await?;
        tracing::info!(counterparty_id = %counterparty.id_typed(), "counterparty created");
        Ok(counterparty)
    }

    #[instrument(skip(self, details), err)]
    pub async fn update(
        &self,
        id: CounterpartyId,
        details: CounterpartyDetails,
    ) -> ServiceResult<Counterparty> {
        let mut counterparty = self.require(id).await?;
        counterparty.update(details)?;
        self.store.update_counterparty(&counterparty).await?;
        tracing::info!(counterparty_id = %id, "counterparty updated");
        Ok(counterparty)
    }

    /// Remove a counterparty. Invoices billed to it keep the stored name.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: CounterpartyId) -> ServiceResult<()> {
        self.store.delete_counterparty(id).await?;
        tracing::info!(counterparty_id = %id, "counterparty deleted");
        Ok(())
    }

    pub async fn get(&self, id: CounterpartyId) -> ServiceResult<Option<Counterparty>> {
        Ok(self.store.get_counterparty(id).await?)
    }

    pub async fn require(&self, id: CounterpartyId) -> ServiceResult<Counterparty> {
        self.store
            .get_counterparty(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("counterparty {id}")))
    }

    /// All counterparties ordered by name, filtered by name / GSTIN when `query` is non-empty.
    pub async fn search(&self, query: &str) -> ServiceResult<Vec<Counterparty>> {
        Ok(self.store.search_counterparties(query).await?)
    }
}
