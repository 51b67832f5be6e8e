//! Domain primitives shared by every cadence crate.
//!
//! This crate has zero internal dependencies so the database layer, the
//! automation engine and the HTTP surface can all use the same rule-type
//! names, VIP arithmetic, epoch keys and template contracts.

pub mod automation;
pub mod epoch;
pub mod error;
pub mod templates;
pub mod types;
pub mod vip;
