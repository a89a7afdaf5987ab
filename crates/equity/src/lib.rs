//! `captable-equity` — the cap-table domain.
//!
//! Shareholder profiles, immutable share-issuance records, and the read-side
//! ownership computation. Pure data and validation; persistence lives in
//! `captable-store`.

pub mod issuance;
pub mod ownership;
pub mod shareholder;

pub use issuance::{
    IssuanceRequest, MAX_PRICE_PER_SHARE_CENTS, MAX_SHARES_PER_ISSUANCE, ShareClass, ShareIssuance,
};
pub use ownership::{OwnershipStake, ownership_breakdown, shares_held};
pub use shareholder::{Shareholder, ShareholderProfile};
