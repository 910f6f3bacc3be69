//! Identity and privilege: token issuance, the per-request requester and the
//! real-versus-simulated write decision.

pub mod gate;
pub mod requester;
pub mod token;

pub use gate::{Grant, Operation, PrivilegeGate};
pub use requester::{Requester, bearer_token};
pub use token::{RequesterClaims, TokenAuthority, TokenError, TokenPair};
