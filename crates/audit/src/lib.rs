//! `captable-audit` — append-only audit trail record types.
//!
//! Every mutating operation produces at least one [`AuditEvent`]. Events are
//! never edited or deleted; the compliance value of the system rests on this
//! trail being complete and immutable.

pub mod event;

pub use event::{AuditAction, AuditEvent};
