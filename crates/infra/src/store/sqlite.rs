//! SQLite-backed store.
//!
//! Each table keeps the full record as a JSON `data` column plus a few plain
//! columns used for lookups and ordering (name, batch, HSN, GSTIN, invoice
//! number, dates). The JSON payload is the source of truth; the plain columns
//! are rewritten from it on every write.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (unique violation) | `AlreadyExists` (on insert) |
//! | Database (other) | `Backend` |
//! | PoolClosed / RowNotFound / other | `Backend` |
//!
//! JSON encode/decode failures map to `Serialization`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::instrument;

use pharmabill_catalog::CatalogItem;
use pharmabill_core::{CatalogItemId, CounterpartyId, InvoiceId};
use pharmabill_invoicing::Invoice;
use pharmabill_parties::Counterparty;

use super::r#trait::{
    AppliedAdjustment, CatalogRepository, CounterpartyRepository, FinalizationReceipt,
    FinalizationStore, InvoiceRepository, StoreError, StoreResult, sort_counterparties,
    sort_items,
};
use super::{CATALOG_ITEMS, COUNTERPARTIES, INVOICES};

const SCHEMA: [&str; 12] = [
    r#"
    CREATE TABLE IF NOT EXISTS catalog_items (
        id        TEXT PRIMARY KEY NOT NULL,
        name      TEXT NOT NULL,
        batch_no  TEXT NOT NULL,
        hsn       TEXT NOT NULL,
        stock     INTEGER NOT NULL,
        data      TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_catalog_items_name ON catalog_items (name COLLATE NOCASE)",
    "CREATE INDEX IF NOT EXISTS idx_catalog_items_batch_no ON catalog_items (batch_no)",
    "CREATE INDEX IF NOT EXISTS idx_catalog_items_hsn ON catalog_items (hsn)",
    r#"
    CREATE TABLE IF NOT EXISTS counterparties (
        id      TEXT PRIMARY KEY NOT NULL,
        name    TEXT NOT NULL,
        gstin   TEXT NOT NULL,
        mobile  TEXT NOT NULL,
        data    TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_counterparties_name ON counterparties (name COLLATE NOCASE)",
    "CREATE INDEX IF NOT EXISTS idx_counterparties_gstin ON counterparties (gstin)",
    "CREATE INDEX IF NOT EXISTS idx_counterparties_mobile ON counterparties (mobile)",
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id               TEXT PRIMARY KEY NOT NULL,
        invoice_no       TEXT NOT NULL,
        date             TEXT NOT NULL,
        counterparty_id  TEXT NOT NULL,
        grand_total      TEXT NOT NULL,
        created_at       TEXT NOT NULL,
        data             TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_invoices_invoice_no ON invoices (invoice_no)",
    "CREATE INDEX IF NOT EXISTS idx_invoices_date ON invoices (date, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_invoices_counterparty_id ON invoices (counterparty_id)",
];

/// SQLite-backed store.
///
/// Uses a SQLx connection pool. Finalization runs in one transaction.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool. Call [`SqliteStore::migrate`] before use.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url` and ensure the schema.
    #[instrument(skip_all, fields(url = %url), err)]
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("parse_url", e))?
            .create_if_missing(true);

        let pool_options = if is_memory_url(url) {
            // Every connection to `:memory:` is a separate database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_data<T: DeserializeOwned>(
        &self,
        operation: &str,
        sql: &str,
        id: String,
    ) -> StoreResult<Option<T>> {
        let row = sqlx::query(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.map(|row| decode_row(&row)).transpose()
    }

    async fn fetch_all_data<T: DeserializeOwned>(
        &self,
        operation: &str,
        sql: &str,
    ) -> StoreResult<Vec<T>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.iter().map(decode_row).collect()
    }

    async fn count(&self, operation: &str, sql: &str) -> StoreResult<u64> {
        let row = sqlx::query(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        read_count(&row)
    }

    async fn delete_row(
        &self,
        operation: &str,
        sql: &str,
        collection: &'static str,
        id: uuid::Uuid,
    ) -> StoreResult<()> {
        let result = sqlx::query(sql)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn encode<T: Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode_row<T: DeserializeOwned>(row: &SqliteRow) -> StoreResult<T> {
    let data: String = row
        .try_get("data")
        .map_err(|e| StoreError::Backend(format!("failed to read data column: {e}")))?;
    serde_json::from_str(&data).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn read_count(row: &SqliteRow) -> StoreResult<u64> {
    let total: i64 = row
        .try_get("total")
        .map_err(|e| StoreError::Backend(format!("failed to read count: {e}")))?;
    Ok(total.max(0) as u64)
}

async fn write_item(
    tx: &mut Transaction<'_, Sqlite>,
    item: &CatalogItem,
) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE catalog_items
        SET name = ?2, batch_no = ?3, hsn = ?4, stock = ?5, data = ?6
        WHERE id = ?1
        "#,
    )
    .bind(item.id_typed().to_string())
    .bind(item.name())
    .bind(item.batch_no())
    .bind(item.hsn())
    .bind(item.stock())
    .bind(encode(item)?)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("update_item", e))?;
    Ok(result.rows_affected())
}

async fn apply_invoice(
    tx: &mut Transaction<'_, Sqlite>,
    invoice: &Invoice,
) -> StoreResult<FinalizationReceipt> {
    sqlx::query(
        r#"
        INSERT INTO invoices (id, invoice_no, date, counterparty_id, grand_total, created_at, data)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(invoice.id_typed().to_string())
    .bind(invoice.invoice_no())
    .bind(invoice.date().to_string())
    .bind(invoice.counterparty_id().to_string())
    .bind(invoice.totals().grand_total.to_string())
    .bind(
        invoice
            .created_at()
            .to_rfc3339_opts(SecondsFormat::Micros, true),
    )
    .bind(encode(invoice)?)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_insert_error("insert_invoice", e, INVOICES, invoice.id_typed().into()))?;

    let mut receipt = FinalizationReceipt::default();
    for adjustment in invoice.stock_adjustments() {
        let row = sqlx::query("SELECT data FROM catalog_items WHERE id = ?1")
            .bind(adjustment.item_id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("load_item_for_adjustment", e))?;

        let Some(row) = row else {
            receipt.skipped.push(adjustment.item_id);
            continue;
        };

        let mut item: CatalogItem = decode_row(&row)?;
        let stock_after = item.apply_stock_delta(adjustment.delta);
        write_item(tx, &item).await?;

        receipt.applied.push(AppliedAdjustment {
            item_id: adjustment.item_id,
            delta: adjustment.delta,
            stock_after,
        });
    }

    Ok(receipt)
}

#[async_trait]
impl CatalogRepository for SqliteStore {
    #[instrument(skip_all, fields(item_id = %item.id_typed()), err)]
    async fn insert_item(&self, item: &CatalogItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO catalog_items (id, name, batch_no, hsn, stock, data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(item.id_typed().to_string())
        .bind(item.name())
        .bind(item.batch_no())
        .bind(item.hsn())
        .bind(item.stock())
        .bind(encode(item)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error("insert_item", e, CATALOG_ITEMS, item.id_typed().into()))?;
        Ok(())
    }

    #[instrument(skip_all, fields(item_id = %item.id_typed()), err)]
    async fn update_item(&self, item: &CatalogItem) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let affected = write_item(&mut tx, item).await?;
        if affected == 0 {
            rollback(tx, "update_item").await;
            return Err(StoreError::not_found(CATALOG_ITEMS, item.id_typed()));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete_item(&self, id: CatalogItemId) -> StoreResult<()> {
        self.delete_row(
            "delete_item",
            "DELETE FROM catalog_items WHERE id = ?1",
            CATALOG_ITEMS,
            id.into(),
        )
        .await
    }

    async fn get_item(&self, id: CatalogItemId) -> StoreResult<Option<CatalogItem>> {
        self.fetch_data(
            "get_item",
            "SELECT data FROM catalog_items WHERE id = ?1",
            id.to_string(),
        )
        .await
    }

    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        // SQLite's NOCASE folds ASCII only; order in Rust like the in-memory store.
        let mut items = self
            .fetch_all_data("list_items", "SELECT data FROM catalog_items")
            .await?;
        sort_items(&mut items);
        Ok(items)
    }

    async fn count_items(&self) -> StoreResult<u64> {
        self.count("count_items", "SELECT COUNT(*) AS total FROM catalog_items")
            .await
    }

    async fn count_low_stock(&self, threshold: i64) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM catalog_items WHERE stock < ?1")
            .bind(threshold)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_low_stock", e))?;
        read_count(&row)
    }
}

#[async_trait]
impl CounterpartyRepository for SqliteStore {
    #[instrument(skip_all, fields(counterparty_id = %counterparty.id_typed()), err)]
    async fn insert_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO counterparties (id, name, gstin, mobile, data)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(counterparty.id_typed().to_string())
        .bind(counterparty.name())
        .bind(counterparty.gstin())
        .bind(counterparty.mobile())
        .bind(encode(counterparty)?)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_insert_error(
                "insert_counterparty",
                e,
                COUNTERPARTIES,
                counterparty.id_typed().into(),
            )
        })?;
        Ok(())
    }

    #[instrument(skip_all, fields(counterparty_id = %counterparty.id_typed()), err)]
    async fn update_counterparty(&self, counterparty: &Counterparty) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE counterparties
            SET name = ?2, gstin = ?3, mobile = ?4, data = ?5
            WHERE id = ?1
            "#,
        )
        .bind(counterparty.id_typed().to_string())
        .bind(counterparty.name())
        .bind(counterparty.gstin())
        .bind(counterparty.mobile())
        .bind(encode(counterparty)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_counterparty", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(COUNTERPARTIES, counterparty.id_typed()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(counterparty_id = %id), err)]
    async fn delete_counterparty(&self, id: CounterpartyId) -> StoreResult<()> {
        self.delete_row(
            "delete_counterparty",
            "DELETE FROM counterparties WHERE id = ?1",
            COUNTERPARTIES,
            id.into(),
        )
        .await
    }

    async fn get_counterparty(&self, id: CounterpartyId) -> StoreResult<Option<Counterparty>> {
        self.fetch_data(
            "get_counterparty",
            "SELECT data FROM counterparties WHERE id = ?1",
            id.to_string(),
        )
        .await
    }

    async fn list_counterparties(&self) -> StoreResult<Vec<Counterparty>> {
        let mut parties = self
            .fetch_all_data("list_counterparties", "SELECT data FROM counterparties")
            .await?;
        sort_counterparties(&mut parties);
        Ok(parties)
    }

    async fn count_counterparties(&self) -> StoreResult<u64> {
        self.count(
            "count_counterparties",
            "SELECT COUNT(*) AS total FROM counterparties",
        )
        .await
    }
}

#[async_trait]
impl InvoiceRepository for SqliteStore {
    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        self.fetch_data(
            "get_invoice",
            "SELECT data FROM invoices WHERE id = ?1",
            id.to_string(),
        )
        .await
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        self.fetch_all_data(
            "list_invoices",
            "SELECT data FROM invoices ORDER BY date DESC, created_at DESC",
        )
        .await
    }

    async fn count_invoices(&self) -> StoreResult<u64> {
        self.count("count_invoices", "SELECT COUNT(*) AS total FROM invoices")
            .await
    }

    async fn invoice_no_exists(&self, invoice_no: &str) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 AS hit FROM invoices WHERE invoice_no = ?1 LIMIT 1")
            .bind(invoice_no)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoice_no_exists", e))?;
        Ok(row.is_some())
    }

    async fn total_revenue(&self) -> StoreResult<Decimal> {
        let rows = sqlx::query("SELECT grand_total FROM invoices")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("total_revenue", e))?;

        rows.iter().try_fold(Decimal::ZERO, |acc, row| {
            let raw: String = row
                .try_get("grand_total")
                .map_err(|e| StoreError::Backend(format!("failed to read grand_total: {e}")))?;
            let value = Decimal::from_str(&raw)
                .map_err(|e| StoreError::Serialization(format!("bad grand_total {raw:?}: {e}")))?;
            Ok(acc + value)
        })
    }
}

#[async_trait]
impl FinalizationStore for SqliteStore {
    #[instrument(
        skip_all,
        fields(
            invoice_id = %invoice.id_typed(),
            invoice_no = %invoice.invoice_no(),
            line_count = invoice.lines().len()
        ),
        err
    )]
    async fn commit_invoice(&self, invoice: &Invoice) -> StoreResult<FinalizationReceipt> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let receipt = match apply_invoice(&mut tx, invoice).await {
            Ok(receipt) => receipt,
            Err(err) => {
                rollback(tx, "commit_invoice").await;
                return Err(err);
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(receipt)
    }
}

/// Roll back `tx`, logging a failure instead of masking the caller's error.
async fn rollback(tx: Transaction<'_, Sqlite>, operation: &str) {
    if let Err(err) = tx.rollback().await {
        tracing::warn!(operation, error = %err, "rollback failed");
    }
}

fn map_insert_error(
    operation: &str,
    err: sqlx::Error,
    collection: &'static str,
    id: uuid::Uuid,
) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::already_exists(collection, id);
        }
    }
    map_sqlx_error(operation, err)
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            tracing::error!(operation, error = %db_err, "sqlite error");
            StoreError::Backend(format!(
                "database error in {}: {}",
                operation,
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Backend(format!("unexpected row not found in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
