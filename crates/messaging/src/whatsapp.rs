//! WhatsApp Cloud API template sender.
//!
//! [`WhatsAppGateway`] POSTs a `template` message to
//! `{api_base}/{phone_number_id}/messages`. One attempt per call; the
//! client-level timeout bounds the whole request.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::WhatsAppConfig;
use crate::gateway::{normalize_phone, GatewayError, MessagingGateway, TemplateMessage};

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

// ---------------------------------------------------------------------------
// WhatsAppGateway
// ---------------------------------------------------------------------------

/// Sends template messages through the WhatsApp Cloud API.
pub struct WhatsAppGateway {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppGateway {
    /// Build a gateway with an HTTP client bounded by `config.timeout`.
    pub fn new(config: WhatsAppConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            self.config.phone_number_id
        )
    }
}

/// Build the Cloud API request body for a template message.
pub fn build_payload(to: &str, message: &TemplateMessage) -> serde_json::Value {
    let parameters: Vec<_> = message
        .parameters
        .iter()
        .map(|text| json!({ "type": "text", "text": text }))
        .collect();

    let mut template = json!({
        "name": message.template_name,
        "language": { "code": message.language_code },
    });
    if !parameters.is_empty() {
        template["components"] = json!([{ "type": "body", "parameters": parameters }]);
    }

    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "template",
        "template": template,
    })
}

/// Classify a response body into a message id or a gateway error.
fn parse_response(body: &str) -> Result<String, GatewayError> {
    let parsed: SendResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("{e}: {body}")))?;

    if let Some(error) = parsed.error {
        return Err(GatewayError::Rejected {
            code: error.code,
            message: error.message,
        });
    }

    parsed
        .messages
        .into_iter()
        .next()
        .map(|m| m.id)
        .ok_or_else(|| GatewayError::InvalidResponse(format!("no message id in {body}")))
}

#[async_trait]
impl MessagingGateway for WhatsAppGateway {
    async fn send_template(&self, message: &TemplateMessage) -> Result<String, GatewayError> {
        let to = normalize_phone(&message.phone)
            .ok_or_else(|| GatewayError::InvalidPhone(message.phone.clone()))?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.access_token)
            .json(&build_payload(&to, message))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match parse_response(&body) {
            Ok(id) => {
                tracing::debug!(template = %message.template_name, message_id = %id, "Template message accepted");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(http_status = status.as_u16(), error = %e, "Template message rejected");
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
