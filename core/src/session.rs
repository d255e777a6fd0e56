//! Editing session: the caller's working state.
//!
//! The engine is stateless; the session is not. It holds the current
//! input snapshot, the authorized-discount ledger and the policy, and
//! produces a fresh settlement on demand.
//!
//! RULES:
//!   - Every mutation replaces state wholesale; there is no partial update.
//!   - With a store attached, a mutation and its event are persisted in one
//!     transaction before the mutation is applied in memory. A failed write
//!     leaves both the session and the store unchanged.
//!   - Every mutation emits exactly one SessionEvent. The sequence only
//!     advances once the event is stored.

use crate::{
    access::AccessLevel,
    config::PolicyConfig,
    error::{EngineResult, SettlementError},
    event::{EventLogEntry, SessionEvent},
    input::SettlementInput,
    ledger::{AuthorizedDiscountEntry, AuthorizedDiscountLedger, NewDiscountEntry},
    report::{self, ExportFormat},
    settlement::{SettlementAggregator, SettlementResult},
    store::SessionStore,
    types::{EntryId, SessionId},
};
use chrono::Utc;

pub struct SettlementSession {
    session_id: SessionId,
    policy:     PolicyConfig,
    input:      SettlementInput,
    ledger:     AuthorizedDiscountLedger,
    store:      Option<SessionStore>,
    events:     Vec<SessionEvent>,
    sequence:   u64,
}

impl SettlementSession {
    /// An in-memory session.
    pub fn new(policy: PolicyConfig) -> Self {
        let mut session = Self::blank(uuid::Uuid::new_v4().to_string(), policy, None);
        let opened = SessionEvent::SessionOpened {
            session_id: session.session_id.clone(),
            policy_id:  session.policy.policy_id.clone(),
        };
        // No store: recording cannot fail.
        let _ = session.record(opened);
        session
    }

    /// A session persisted to `store`.
    pub fn with_store(policy: PolicyConfig, store: SessionStore) -> EngineResult<Self> {
        let session_id = uuid::Uuid::new_v4().to_string();
        store.insert_session(&session_id, &policy.policy_id, env!("CARGO_PKG_VERSION"), Utc::now())?;
        let mut session = Self::blank(session_id, policy, Some(store));
        session.persist_input()?;
        session.record(SessionEvent::SessionOpened {
            session_id: session.session_id.clone(),
            policy_id:  session.policy.policy_id.clone(),
        })?;
        log::info!(
            "session={} opened under policy '{}'",
            session.session_id, session.policy.policy_id
        );
        Ok(session)
    }

    /// Reopen a stored session: input draft and ledger come back as saved.
    pub fn resume(session_id: &str, policy: PolicyConfig, store: SessionStore) -> EngineResult<Self> {
        let row = store
            .get_session(session_id)?
            .ok_or_else(|| SettlementError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        if row.policy_id != policy.policy_id {
            log::warn!(
                "session={session_id} was opened under '{}', resuming under '{}'",
                row.policy_id, policy.policy_id
            );
        }

        let input = store.load_input(session_id)?.unwrap_or_default();
        let ledger = AuthorizedDiscountLedger::from_entries(
            store.discounts_for_session(session_id)?,
            row.next_entry_id,
        );
        let sequence = store.last_event_sequence(session_id)?.unwrap_or(0);

        let mut session = Self::blank(session_id.to_string(), policy, Some(store));
        session.input = input;
        session.ledger = ledger;
        session.sequence = sequence;
        session.record(SessionEvent::SessionResumed {
            session_id:   session.session_id.clone(),
            ledger_count: session.ledger.len(),
        })?;
        log::info!(
            "session={session_id} resumed with {} authorized discount(s)",
            session.ledger.len()
        );
        Ok(session)
    }

    fn blank(session_id: SessionId, policy: PolicyConfig, store: Option<SessionStore>) -> Self {
        Self {
            session_id,
            policy,
            input: Default::default(),
            ledger: AuthorizedDiscountLedger::new(),
            store,
            events: Vec::new(),
            sequence: 0,
        }
    }

    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn policy(&self) -> &PolicyConfig { &self.policy }
    pub fn input(&self) -> &SettlementInput { &self.input }
    pub fn ledger(&self) -> &AuthorizedDiscountLedger { &self.ledger }
    pub fn events(&self) -> &[SessionEvent] { &self.events }
    pub fn store(&self) -> Option<&SessionStore> { self.store.as_ref() }

    /// Close the session, handing back its store.
    pub fn into_store(self) -> Option<SessionStore> {
        self.store
    }

    /// Replace the input snapshot. Negative or unrounded amounts are
    /// sanitized on the way in.
    pub fn update_input(&mut self, input: SettlementInput) -> EngineResult<()> {
        let input = input.sanitized();
        let event = SessionEvent::InputUpdated {
            sales_revenue:  input.sales_revenue,
            discount_given: input.discount_given,
        };
        if let Some(store) = &self.store {
            store.save_input(&self.session_id, &input, Some(&self.log_entry(&event)?))?;
        }
        self.input = input;
        self.applied(event);
        Ok(())
    }

    /// Authorize a discount. Invalid entries are rejected with field
    /// errors and leave the ledger untouched.
    pub fn add_discount(&mut self, new: NewDiscountEntry) -> EngineResult<EntryId> {
        let entry = match self.ledger.stage(&new) {
            Ok(entry) => entry,
            Err(SettlementError::Validation(errors)) => {
                log::warn!(
                    "session={} discount rejected: {}",
                    self.session_id,
                    crate::validation::describe(&errors)
                );
                self.record(SessionEvent::DiscountRejected { errors: errors.clone() })?;
                return Err(SettlementError::Validation(errors));
            }
            Err(e) => return Err(e),
        };

        let event = SessionEvent::DiscountAuthorized {
            entry_id:      entry.id,
            amount:        entry.amount,
            authorized_by: entry.authorized_by.clone(),
        };
        if let Some(store) = &self.store {
            store.insert_discount(&self.session_id, &entry, &self.log_entry(&event)?)?;
        }

        let id = entry.id;
        log::info!(
            "session={} discount {id} of {} authorized by {}",
            self.session_id, entry.amount, entry.authorized_by
        );
        self.ledger.commit(entry);
        self.applied(event);
        Ok(id)
    }

    pub fn remove_discount(&mut self, id: EntryId) -> EngineResult<AuthorizedDiscountEntry> {
        let amount = self
            .ledger
            .get(id)
            .map(|e| e.amount)
            .ok_or(SettlementError::EntryNotFound { id })?;
        let event = SessionEvent::DiscountRemoved { entry_id: id, amount };
        if let Some(store) = &self.store {
            if !store.delete_discount(&self.session_id, id, &self.log_entry(&event)?)? {
                log::warn!("session={} discount {id} missing from store", self.session_id);
            }
        }
        let removed = self.ledger.remove_entry(id)?;
        log::info!("session={} discount {id} removed", self.session_id);
        self.applied(event);
        Ok(removed)
    }

    /// Compute a fresh settlement from the current snapshot.
    pub fn settle(&mut self) -> EngineResult<SettlementResult> {
        let result = SettlementAggregator::new(&self.policy).settle(&self.input, &self.ledger);
        self.record(SessionEvent::SettlementComputed {
            net_payable:     result.consultant.net_payable,
            badge:           result.badge.state.label().to_string(),
            excess_discount: result.consultant.excess_discount,
        })?;
        Ok(result)
    }

    /// Settle and render the report `access` allows.
    pub fn export(&mut self, access: AccessLevel, format: ExportFormat) -> EngineResult<String> {
        let result = self.settle()?;
        let rendered = report::export(&result, access, format)?;
        self.record(SessionEvent::ReportExported { elevated: access.is_elevated() })?;
        Ok(rendered)
    }

    fn persist_input(&self) -> EngineResult<()> {
        if let Some(store) = &self.store {
            store.save_input(&self.session_id, &self.input, None)?;
        }
        Ok(())
    }

    /// The stored form of `event`, numbered as the next in sequence.
    fn log_entry(&self, event: &SessionEvent) -> EngineResult<EventLogEntry> {
        Ok(EventLogEntry {
            id:          None,
            session_id:  self.session_id.clone(),
            sequence:    self.sequence + 1,
            event_type:  event.type_name().to_string(),
            payload:     serde_json::to_string(event)?,
            recorded_at: Utc::now(),
        })
    }

    /// Record an event that has no state change to persist with it.
    fn record(&mut self, event: SessionEvent) -> EngineResult<()> {
        if let Some(store) = &self.store {
            store.append_event(&self.log_entry(&event)?)?;
        }
        self.applied(event);
        Ok(())
    }

    /// Account for an event already stored (or with no store to hold it).
    fn applied(&mut self, event: SessionEvent) {
        self.sequence += 1;
        log::debug!("session={} event #{} {}", self.session_id, self.sequence, event.type_name());
        self.events.push(event);
    }
}
