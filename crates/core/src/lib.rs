//! Pure domain logic for the affiliate payout engine.
//!
//! Everything in this crate is I/O-free: status state machines, the
//! commission tier registry, disbursement fee calculation, fraud rules,
//! payout-period arithmetic, eligibility rules, and the gateway status
//! vocabulary. Persistence lives in `payrun-db`; orchestration in
//! `payrun-worker` and `payrun-api`.

pub mod clearing;
pub mod eligibility;
pub mod error;
pub mod fees;
pub mod gateway;
pub mod period;
pub mod program;
pub mod status;
pub mod tiers;
pub mod types;
