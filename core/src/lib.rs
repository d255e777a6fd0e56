//! commission-core: settlement computation for travel-agency consultants.
//!
//! The engine is the pure part: `settlement::settle` maps an input
//! snapshot, the authorized-discount ledger and a policy to a fully
//! itemized `SettlementResult`. Everything else is boundary: the editing
//! session, its SQLite store, validation, the access gate and export.

pub mod access;
pub mod badge;
pub mod config;
pub mod error;
pub mod event;
pub mod franchise;
pub mod hospitality;
pub mod input;
pub mod ledger;
pub mod money;
pub mod report;
pub mod session;
pub mod settlement;
pub mod store;
pub mod tier_commission;
pub mod types;
pub mod validation;

pub use config::PolicyConfig;
pub use error::{EngineResult, SettlementError};
pub use input::{ConsultantIdentity, HospitalityRevenue, SettlementInput};
pub use ledger::{AuthorizedDiscountEntry, AuthorizedDiscountLedger, NewDiscountEntry};
pub use session::SettlementSession;
pub use settlement::{settle, SettlementAggregator, SettlementResult};
