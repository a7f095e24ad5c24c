//! In-process background jobs spawned by the API server.

pub mod clearing_sweep;
