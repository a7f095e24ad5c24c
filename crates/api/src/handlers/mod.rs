//! HTTP handlers.

pub mod batches;
pub mod clearing;
pub mod health;
pub mod payout_preview;
pub mod webhooks;
