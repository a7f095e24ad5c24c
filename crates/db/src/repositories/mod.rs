//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod affiliate_repo;
pub mod conversion_repo;
pub mod payout_item_repo;
pub mod payout_repo;
pub mod program_config_repo;
pub mod verification_repo;

pub use affiliate_repo::AffiliateRepo;
pub use conversion_repo::ConversionRepo;
pub use payout_item_repo::PayoutItemRepo;
pub use payout_repo::PayoutRepo;
pub use program_config_repo::ProgramConfigRepo;
pub use verification_repo::VerificationRepo;
