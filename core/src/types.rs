//! Shared primitive types used across the settlement engine.

use rust_decimal::Decimal;

/// A monetary amount in the settlement currency.
/// Derived values always carry two decimal places (see `money::round2`).
pub type Money = Decimal;

/// A unitless fraction, e.g. 0.10 for a 10% franchise.
pub type Rate = Decimal;

/// Identifier of an authorized-discount ledger entry.
/// Assigned monotonically by the ledger, never reused within a session.
pub type EntryId = u64;

/// The canonical editing-session identifier (uuid v4 string).
pub type SessionId = String;
