//! Billing workflow: draft an invoice, finalize it atomically, browse history.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use tracing::instrument;

use pharmabill_core::{CatalogItemId, CounterpartyId, InvoiceId};
use pharmabill_infra::BillingStore;
use pharmabill_invoicing::{Invoice, InvoiceDocument, InvoiceDraft, IssuerProfile, generate_invoice_number};

use crate::errors::{ServiceError, ServiceResult};

/// Random candidates tried before settling for a possibly duplicate number.
pub const INVOICE_NUMBER_ATTEMPTS: usize = 5;

#[derive(Debug)]
pub struct BillingService<S> {
    store: Arc<S>,
    issuer: IssuerProfile,
}

impl<S> Clone for BillingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            issuer: self.issuer.clone(),
        }
    }
}

impl<S> BillingService<S>
where
    S: BillingStore,
{
    pub fn new(store: Arc<S>, issuer: IssuerProfile) -> Self {
        Self { store, issuer }
    }

    pub fn issuer(&self) -> &IssuerProfile {
        &self.issuer
    }

    /// Suggest an invoice number for `date` that no stored invoice uses yet.
    pub async fn next_invoice_number(&self, date: NaiveDate) -> ServiceResult<String> {
        self.pick_invoice_number(date, |d| generate_invoice_number(d, &mut rand::thread_rng()))
            .await
    }

    /// Same as [`Self::next_invoice_number`] with a caller-supplied generator.
    pub async fn next_invoice_number_with<R>(
        &self,
        date: NaiveDate,
        rng: &mut R,
    ) -> ServiceResult<String>
    where
        R: Rng + Send,
    {
        self.pick_invoice_number(date, |d| generate_invoice_number(d, &mut *rng))
            .await
    }

    async fn pick_invoice_number<F>(&self, date: NaiveDate, mut candidate: F) -> ServiceResult<String>
    where
        F: FnMut(NaiveDate) -> String + Send,
    {
        let mut last = candidate(date);
        for attempt in 1..=INVOICE_NUMBER_ATTEMPTS {
            if !self.store.invoice_no_exists(&last).await? {
                return Ok(last);
            }
            tracing::warn!(invoice_no = %last, attempt, "invoice number already in use");
            if attempt < INVOICE_NUMBER_ATTEMPTS {
                last = candidate(date);
            }
        }
        tracing::warn!(
            invoice_no = %last,
            "no unused invoice number found; keeping the last candidate"
        );
        Ok(last)
    }

    /// Fresh draft for `date` carrying a suggested invoice number.
    pub async fn new_draft(&self, date: NaiveDate) -> ServiceResult<InvoiceDraft> {
        let invoice_no = self.next_invoice_number(date).await?;
        Ok(InvoiceDraft::new(invoice_no, date))
    }

    /// Add the current catalog state of `item_id` as a new line. Returns the line index.
    pub async fn add_item_to_draft(
        &self,
        draft: &mut InvoiceDraft,
        item_id: CatalogItemId,
    ) -> ServiceResult<usize> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("catalog item {item_id}")))?;
        Ok(draft.add_item(&item))
    }

    pub async fn select_counterparty(
        &self,
        draft: &mut InvoiceDraft,
        counterparty_id: CounterpartyId,
    ) -> ServiceResult<()> {
        let counterparty = self
            .store
            .get_counterparty(counterparty_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("counterparty {counterparty_id}")))?;
        draft.select_counterparty(counterparty);
        Ok(())
    }

    /// Persist the draft as an invoice and decrement stock for every line.
    ///
    /// Validation happens before anything is written. The invoice and all
    /// stock changes are committed together; on failure nothing is stored and
    /// the draft is left untouched so the user can retry.
    #[instrument(
        skip_all,
        fields(invoice_no = %draft.invoice_no(), lines = draft.lines().len()),
        err
    )]
    pub async fn finalize(&self, draft: &InvoiceDraft) -> ServiceResult<Invoice> {
        let invoice = draft.finalize(InvoiceId::new(), Utc::now())?;

        let receipt = match self.store.commit_invoice(&invoice).await {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::error!(invoice_id = %invoice.id_typed(), error = %err, "failed to save invoice");
                return Err(err.into());
            }
        };

        for item_id in &receipt.skipped {
            tracing::warn!(item_id = %item_id, "item no longer in catalog; stock not adjusted");
        }
        for applied in receipt.negative_stock() {
            tracing::warn!(
                item_id = %applied.item_id,
                stock = applied.stock_after,
                "stock went negative"
            );
        }

        tracing::info!(
            invoice_id = %invoice.id_typed(),
            grand_total = %invoice.totals().grand_total,
            "invoice saved"
        );
        Ok(invoice)
    }

    /// Invoice history, newest first, filtered by invoice number or counterparty name.
    pub async fn history(&self, query: &str) -> ServiceResult<Vec<Invoice>> {
        Ok(self.store.search_invoices(query).await?)
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> ServiceResult<Invoice> {
        self.store
            .get_invoice(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("invoice {id}")))
    }

    /// Printable document for a stored invoice.
    ///
    /// Uses the counterparty's current record when it still exists and falls
    /// back to the name stored on the invoice otherwise.
    pub async fn document(&self, id: InvoiceId) -> ServiceResult<InvoiceDocument> {
        let invoice = self.get_invoice(id).await?;
        let counterparty = self.store.get_counterparty(invoice.counterparty_id()).await?;
        Ok(InvoiceDocument::build(
            &invoice,
            counterparty.as_ref(),
            &self.issuer,
        ))
    }
}
