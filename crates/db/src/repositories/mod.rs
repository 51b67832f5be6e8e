//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async data-access
//! methods that accept `&PgPool` as the first argument.

pub mod automation_log_repo;
pub mod automation_repo;
pub mod business_repo;
pub mod customer_repo;
pub mod execution_log_repo;
pub mod point_load_repo;
pub mod promotion_repo;
pub mod redeemable_item_repo;

pub use automation_log_repo::AutomationLogRepo;
pub use automation_repo::AutomationRepo;
pub use business_repo::BusinessRepo;
pub use customer_repo::CustomerRepo;
pub use execution_log_repo::ExecutionLogRepo;
pub use point_load_repo::PointLoadRepo;
pub use promotion_repo::PromotionRepo;
pub use redeemable_item_repo::RedeemableItemRepo;
