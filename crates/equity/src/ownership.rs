//! Read-side ownership aggregation.
//!
//! Ownership percentages are a pure function of the full issuance ledger and
//! are recomputed on every read. Nothing here is ever persisted; a stored
//! running total could silently drift from the ledger, and the ledger is the
//! one source of truth.

use std::collections::BTreeMap;

use captable_core::ShareholderId;
use serde::Serialize;

use crate::ShareIssuance;

/// A shareholder's aggregate position derived from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipStake {
    pub shareholder_id: ShareholderId,
    pub total_shares: i64,
    /// Percentage of all issued shares, in `[0, 100]`. Zero when the ledger
    /// is empty.
    pub ownership_pct: f64,
}

/// Aggregate the full ledger into per-shareholder stakes.
///
/// The result is ordered by shareholder id for determinism. Percentages sum
/// to 100 (within floating-point rounding) whenever any shares exist.
pub fn ownership_breakdown(issuances: &[ShareIssuance]) -> Vec<OwnershipStake> {
    let mut totals: BTreeMap<ShareholderId, i64> = BTreeMap::new();
    for issuance in issuances {
        *totals.entry(issuance.shareholder_id).or_insert(0) += issuance.quantity;
    }

    let grand_total: i64 = totals.values().sum();

    totals
        .into_iter()
        .map(|(shareholder_id, total_shares)| OwnershipStake {
            shareholder_id,
            total_shares,
            ownership_pct: if grand_total == 0 {
                0.0
            } else {
                total_shares as f64 * 100.0 / grand_total as f64
            },
        })
        .collect()
}

/// Total shares held by one shareholder.
pub fn shares_held(issuances: &[ShareIssuance], shareholder_id: ShareholderId) -> i64 {
    issuances
        .iter()
        .filter(|i| i.shareholder_id == shareholder_id)
        .map(|i| i.quantity)
        .sum()
}
