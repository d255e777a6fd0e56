//! Session events: the audit trail of one editing session.
//!
//! RULE: every session mutation emits exactly one event, and the event
//! is what gets persisted. Settlement results themselves are never
//! stored; only the figure that was shown.

use crate::{
    types::{EntryId, Money, SessionId},
    validation::FieldError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionOpened {
        session_id: SessionId,
        policy_id:  String,
    },
    SessionResumed {
        session_id:   SessionId,
        ledger_count: usize,
    },
    InputUpdated {
        sales_revenue:  Money,
        discount_given: Money,
    },
    DiscountAuthorized {
        entry_id:      EntryId,
        amount:        Money,
        authorized_by: String,
    },
    DiscountRejected {
        errors: Vec<FieldError>,
    },
    DiscountRemoved {
        entry_id: EntryId,
        amount:   Money,
    },
    SettlementComputed {
        net_payable:     Money,
        badge:           String,
        excess_discount: Money,
    },
    ReportExported {
        elevated: bool,
    },
}

impl SessionEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            SessionEvent::SessionOpened { .. }      => "session_opened",
            SessionEvent::SessionResumed { .. }     => "session_resumed",
            SessionEvent::InputUpdated { .. }       => "input_updated",
            SessionEvent::DiscountAuthorized { .. } => "discount_authorized",
            SessionEvent::DiscountRejected { .. }   => "discount_rejected",
            SessionEvent::DiscountRemoved { .. }    => "discount_removed",
            SessionEvent::SettlementComputed { .. } => "settlement_computed",
            SessionEvent::ReportExported { .. }     => "report_exported",
        }
    }
}

/// A persisted event log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:          Option<i64>,
    pub session_id:  SessionId,
    pub sequence:    u64,
    pub event_type:  String,
    pub payload:     String,
    pub recorded_at: DateTime<Utc>,
}
