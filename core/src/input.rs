//! The settlement input snapshot.
//!
//! An input is an immutable value: every edit produces a new snapshot,
//! and the engine computes a fresh settlement from it. Monetary fields
//! deserialize leniently (unparsable or negative values become zero) so
//! partially-filled forms still settle.

use crate::{
    money::{self, sanitize},
    types::Money,
    validation::{self, FieldError},
};
use serde::{Deserialize, Serialize};

/// Opaque consultant identity. The engine never reads it; validation
/// only gates export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultantIdentity {
    pub name:       String,
    pub tax_id:     String,
    pub payout_key: String,
}

impl ConsultantIdentity {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validation::require(&mut errors, "name", &self.name);
        validation::check_tax_id(&mut errors, "tax_id", &self.tax_id);
        validation::require(&mut errors, "payout_key", &self.payout_key);
        errors
    }
}

/// Hospitality revenue, shaped after the rule variant that consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HospitalityRevenue {
    MarginBand {
        #[serde(default, deserialize_with = "money::lenient")]
        standard: Money,
        #[serde(default, deserialize_with = "money::lenient")]
        high:     Money,
    },
    Volume {
        #[serde(default, deserialize_with = "money::lenient")]
        total: Money,
    },
}

impl Default for HospitalityRevenue {
    fn default() -> Self {
        HospitalityRevenue::MarginBand {
            standard: Money::ZERO,
            high:     Money::ZERO,
        }
    }
}

impl HospitalityRevenue {
    pub fn total(&self) -> Money {
        match self {
            HospitalityRevenue::MarginBand { standard, high } => standard + high,
            HospitalityRevenue::Volume { total } => *total,
        }
    }

    pub(crate) fn sanitized(&self) -> Self {
        match self {
            HospitalityRevenue::MarginBand { standard, high } => HospitalityRevenue::MarginBand {
                standard: sanitize(*standard),
                high:     sanitize(*high),
            },
            HospitalityRevenue::Volume { total } => HospitalityRevenue::Volume {
                total: sanitize(*total),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementInput {
    pub identity:             ConsultantIdentity,
    #[serde(deserialize_with = "money::lenient")]
    pub sales_revenue:        Money,
    #[serde(deserialize_with = "money::lenient")]
    pub discount_given:       Money,
    pub hospitality:          HospitalityRevenue,
    #[serde(deserialize_with = "money::lenient")]
    pub reimbursements:       Money,
    #[serde(deserialize_with = "money::lenient")]
    pub advances:             Money,
    pub has_fixed_stipend:    bool,
    #[serde(deserialize_with = "money::lenient")]
    pub fixed_stipend_amount: Money,
}

impl SettlementInput {
    /// Clamp every monetary field to zero and round to cents.
    /// Inputs built in code skip the lenient deserializer, so the
    /// engine sanitizes again before computing.
    pub fn sanitized(&self) -> Self {
        Self {
            identity:             self.identity.clone(),
            sales_revenue:        sanitize(self.sales_revenue),
            discount_given:       sanitize(self.discount_given),
            hospitality:          self.hospitality.sanitized(),
            reimbursements:       sanitize(self.reimbursements),
            advances:             sanitize(self.advances),
            has_fixed_stipend:    self.has_fixed_stipend,
            fixed_stipend_amount: sanitize(self.fixed_stipend_amount),
        }
    }
}
