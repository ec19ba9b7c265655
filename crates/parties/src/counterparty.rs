use serde::{Deserialize, Serialize};

use pharmabill_core::error::require_text;
use pharmabill_core::{CounterpartyId, DomainResult, Entity};

use crate::region::Region;

/// Editable fields of a counterparty (the "add / edit party" form).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyDetails {
    /// Firm name.
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub gstin: String,
    /// Drug licence number.
    #[serde(default)]
    pub dl_no: String,
    pub mobile: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub region: Region,
}

impl CounterpartyDetails {
    /// Trim text, upper-case the GSTIN and drop a blank email.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            gstin: self.gstin.trim().to_uppercase(),
            dl_no: self.dl_no.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            region: self.region,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("address", &self.address)?;
        require_text("mobile", &self.mobile)?;
        Ok(())
    }
}

/// A trade entity invoices are billed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    id: CounterpartyId,
    details: CounterpartyDetails,
}

impl Counterparty {
    /// Build a new counterparty from form input (normalized, then validated).
    pub fn create(id: CounterpartyId, details: CounterpartyDetails) -> DomainResult<Self> {
        let details = details.normalized();
        details.validate()?;
        Ok(Self { id, details })
    }

    pub fn id_typed(&self) -> CounterpartyId {
        self.id
    }

    pub fn details(&self) -> &CounterpartyDetails {
        &self.details
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn gstin(&self) -> &str {
        &self.details.gstin
    }

    pub fn mobile(&self) -> &str {
        &self.details.mobile
    }

    pub fn region(&self) -> Region {
        self.details.region
    }

    /// Replace all editable fields. On failure the record is left unchanged.
    pub fn update(&mut self, details: CounterpartyDetails) -> DomainResult<()> {
        let details = details.normalized();
        details.validate()?;
        self.details = details;
        Ok(())
    }

    /// Directory search: name or GSTIN, case-insensitive. Empty query matches all.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let lower = query.to_lowercase();
        self.details.name.to_lowercase().contains(&lower)
            || self.details.gstin.to_lowercase().contains(&lower)
    }
}

impl Entity for Counterparty {
    type Id = CounterpartyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
