//! Gateway that logs messages instead of sending them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::gateway::{GatewayError, MessagingGateway, TemplateMessage};

/// Logs every message and returns a synthetic `dry-run-…` id.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunGateway;

#[async_trait]
impl MessagingGateway for DryRunGateway {
    async fn send_template(&self, message: &TemplateMessage) -> Result<String, GatewayError> {
        let message_id = format!("dry-run-{}", Uuid::new_v4());
        tracing::info!(
            phone = %message.phone,
            template = %message.template_name,
            parameters = ?message.parameters,
            message_id = %message_id,
            "Dry-run gateway: message not sent"
        );
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_synthetic_message_id() {
        let message = TemplateMessage {
            phone: "5215550001".into(),
            template_name: "birthday_reward".into(),
            parameters: vec!["Ana".into(), "Free coffee".into()],
            language_code: "es_MX".into(),
        };
        let id = DryRunGateway.send_template(&message).await.unwrap();
        assert!(id.starts_with("dry-run-"));
    }
}
