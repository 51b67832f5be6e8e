//! The messaging gateway seam.

use async_trait::async_trait;
use serde::Serialize;

/// A template message ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateMessage {
    pub phone: String,
    pub template_name: String,
    /// Body parameters in the template's fixed order.
    pub parameters: Vec<String>,
    pub language_code: String,
}

/// Error type for gateway failures. Every variant is recorded as a failed
/// send; none of them is retried in-process.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network, DNS, TLS or client-side timeout failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with an error payload.
    #[error("Gateway rejected message (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// The provider answered 2xx without a message id.
    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),

    /// The phone number cannot be turned into a provider address.
    #[error("Invalid phone number: '{0}'")]
    InvalidPhone(String),
}

/// Sends template messages to customers.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send one template message. Returns the provider message id.
    async fn send_template(&self, message: &TemplateMessage) -> Result<String, GatewayError>;
}

/// Reduce a phone number to its digits, as the provider expects.
///
/// Returns `None` when fewer than eight digits remain.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    (digits.len() >= 8).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_formatting() {
        assert_eq!(
            normalize_phone("+52 (155) 5000-1234").as_deref(),
            Some("5215550001234")
        );
    }

    #[test]
    fn normalize_rejects_short_numbers() {
        assert_eq!(normalize_phone("12-34"), None);
        assert_eq!(normalize_phone(""), None);
    }

    #[test]
    fn rejected_error_display() {
        let err = GatewayError::Rejected {
            code: 132001,
            message: "Template name does not exist".into(),
        };
        assert_eq!(
            err.to_string(),
            "Gateway rejected message (code 132001): Template name does not exist"
        );
    }
}
