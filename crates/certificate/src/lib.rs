//! `captable-certificate` — deterministic share certificate rendering.
//!
//! A certificate is not stored state; it is a pure transform of one issuance
//! record plus a fixed template. The renderer writes every PDF object
//! explicitly — no creation timestamps, no random document ids — so the same
//! input always produces byte-identical output. Legal and audit use of the
//! documents depends on that reproducibility.

pub mod render;

pub use render::{CertificateData, render_certificate};
