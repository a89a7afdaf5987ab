//! `captable-auth` — authentication and authorization boundary.
//!
//! Pure where it can be (claims validation, access policy) and intentionally
//! decoupled from HTTP and storage. The only side-effecting pieces are token
//! signing (`jsonwebtoken`) and password hashing (`argon2`).

pub mod account;
pub mod claims;
pub mod password;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;

pub use account::{UserAccount, normalize_email};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use policy::{AccessError, can_view_issuance, can_view_shareholder, require_admin};
pub use principal::Principal;
pub use roles::Role;
pub use token::{Hs256TokenCodec, TokenCodec, TokenError};
