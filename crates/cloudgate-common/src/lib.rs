//! Shared types for the cloudgate workspace: the error taxonomy, instance
//! records and request argument shapes, the combined per-provider result
//! envelope, and the name-guard policy.

pub mod combined;
pub mod error;
pub mod guard;
pub mod types;

pub use combined::{CombinedDeleteRequest, CombinedRequest, CombinedResult, ProviderOutcome, SlotError};
pub use error::{GatewayError, Result};
pub use guard::NameGuard;
pub use types::*;
