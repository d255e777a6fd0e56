//! Authorized-discount ledger: manager-approved discount exemptions.
//!
//! Append-only with remove-by-id. Entries are immutable once created,
//! kept in insertion order and identified by a monotonically assigned id.
//! The ledger total reduces the commissionable base and appears in the
//! audit trail; it never reaches the franchise or badge computations.

use crate::{
    error::{EngineResult, SettlementError},
    money::{self, round2, sanitize},
    types::{EntryId, Money},
    validation::{self, FieldError},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedDiscountEntry {
    pub id:              EntryId,
    pub amount:          Money,
    pub authorized_by:   String,
    pub date:            Option<NaiveDate>,
    pub reservation_ref: String,
}

/// A discount awaiting authorization into the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewDiscountEntry {
    #[serde(deserialize_with = "money::lenient")]
    pub amount:          Money,
    pub authorized_by:   String,
    pub date:            Option<NaiveDate>,
    pub reservation_ref: String,
}

impl NewDiscountEntry {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.amount <= Decimal::ZERO {
            errors.push(FieldError::new("amount", "must be greater than zero"));
        }
        validation::require(&mut errors, "authorized_by", &self.authorized_by);
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedDiscountLedger {
    entries: Vec<AuthorizedDiscountEntry>,
    next_id: EntryId,
}

impl Default for AuthorizedDiscountLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizedDiscountLedger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a ledger from stored entries. `next_id` is the persisted
    /// high-water mark, so ids of removed entries are not handed out
    /// again. Ids never fall behind the highest stored one either.
    pub fn from_entries(mut entries: Vec<AuthorizedDiscountEntry>, next_id: EntryId) -> Self {
        entries.sort_by_key(|e| e.id);
        let next_id = entries.last().map_or(1, |e| e.id + 1).max(next_id);
        Self { entries, next_id }
    }

    /// Validate and build the next entry without inserting it.
    /// Used when the entry must be persisted before it is applied.
    pub fn stage(&self, new: &NewDiscountEntry) -> EngineResult<AuthorizedDiscountEntry> {
        let errors = new.validate();
        if !errors.is_empty() {
            return Err(SettlementError::Validation(errors));
        }
        Ok(AuthorizedDiscountEntry {
            id:              self.next_id,
            amount:          sanitize(new.amount),
            authorized_by:   new.authorized_by.trim().to_string(),
            date:            new.date,
            reservation_ref: new.reservation_ref.trim().to_string(),
        })
    }

    /// Insert an entry produced by `stage`.
    pub fn commit(&mut self, entry: AuthorizedDiscountEntry) {
        self.next_id = self.next_id.max(entry.id + 1);
        self.entries.push(entry);
    }

    /// Validate and append. On validation failure the ledger is untouched.
    pub fn add_entry(&mut self, new: &NewDiscountEntry) -> EngineResult<EntryId> {
        let entry = self.stage(new)?;
        let id = entry.id;
        self.commit(entry);
        Ok(id)
    }

    pub fn remove_entry(&mut self, id: EntryId) -> EngineResult<AuthorizedDiscountEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(SettlementError::EntryNotFound { id })?;
        Ok(self.entries.remove(pos))
    }

    pub fn get(&self, id: EntryId) -> Option<&AuthorizedDiscountEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    pub fn entries(&self) -> &[AuthorizedDiscountEntry] {
        &self.entries
    }

    pub fn total_authorized(&self) -> Money {
        round2(self.entries.iter().map(|e| e.amount).sum::<Decimal>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
