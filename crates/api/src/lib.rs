//! Payrun API server library.
//!
//! Exposes the building blocks (config, state, error handling, router,
//! gateway client, notifications) so integration tests and the binary
//! entrypoint can both access them.

pub mod background;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod notifications;
pub mod response;
pub mod router;
pub mod state;
