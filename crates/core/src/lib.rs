//! `captable-core` — domain foundation building blocks.
//!
//! Pure primitives shared by every other crate: strongly-typed identifiers
//! and the deterministic domain error taxonomy. No IO, no framework types.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AuditEventId, IssuanceId, ShareholderId, UserId};
