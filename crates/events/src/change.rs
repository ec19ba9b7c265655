use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table a change was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    CatalogItems,
    Counterparties,
    Invoices,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::CatalogItems => "catalog_items",
            Collection::Counterparties => "counterparties",
            Collection::Invoices => "invoices",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Notification that a record was written. Carries identity only; readers
/// re-query the store for the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub record_id: Uuid,
    pub kind: ChangeKind,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(collection: Collection, record_id: impl Into<Uuid>, kind: ChangeKind) -> Self {
        Self {
            collection,
            record_id: record_id.into(),
            kind,
            occurred_at: Utc::now(),
        }
    }

    /// Stable name, e.g. `"invoices.created"`.
    pub fn event_type(&self) -> String {
        let kind = match self.kind {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        };
        format!("{}.{}", self.collection.as_str(), kind)
    }
}

/// Which changes a subscriber wants. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    collections: Vec<Collection>,
    kinds: Vec<ChangeKind>,
    record_id: Option<Uuid>,
}

impl ChangeFilter {
    /// Match every change.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match changes to one collection.
    pub fn collection(collection: Collection) -> Self {
        Self {
            collections: vec![collection],
            ..Self::default()
        }
    }

    /// Also accept changes to `collection`.
    pub fn or_collection(mut self, collection: Collection) -> Self {
        if !self.collections.contains(&collection) {
            self.collections.push(collection);
        }
        self
    }

    /// Restrict to the given change kind (may be called repeatedly).
    pub fn with_kind(mut self, kind: ChangeKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Restrict to a single record.
    pub fn for_record(mut self, record_id: impl Into<Uuid>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        (self.collections.is_empty() || self.collections.contains(&event.collection))
            && (self.kinds.is_empty() || self.kinds.contains(&event.kind))
            && self.record_id.is_none_or(|id| id == event.record_id)
    }
}
