//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` / plain DTOs for the operations that need them

pub mod affiliate;
pub mod conversion;
pub mod payout;
pub mod payout_item;
pub mod program_config;
pub mod verification;
