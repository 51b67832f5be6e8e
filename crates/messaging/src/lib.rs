//! Outbound messaging gateway.
//!
//! - [`MessagingGateway`]: the seam the automation dispatcher calls.
//! - [`WhatsAppGateway`]: WhatsApp Cloud API template sender.
//! - [`DryRunGateway`]: logs instead of sending; used when no credentials
//!   are configured.

pub mod config;
pub mod dry_run;
pub mod gateway;
pub mod whatsapp;

pub use config::WhatsAppConfig;
pub use dry_run::DryRunGateway;
pub use gateway::{GatewayError, MessagingGateway, TemplateMessage};
pub use whatsapp::WhatsAppGateway;
