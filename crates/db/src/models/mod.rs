//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and, where the engine writes the table, a create DTO for inserts.

pub mod automation;
pub mod automation_log;
pub mod business;
pub mod customer;
pub mod execution_log;
pub mod point_load;
pub mod promotion;
pub mod redeemable_item;
