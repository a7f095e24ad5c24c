//! Batch jobs for the affiliate payout engine.
//!
//! The library exposes the clearing sweep so the API server can trigger a
//! run on demand; the binary runs it on a fixed interval.

pub mod clearing;
