//! Gateway configuration loaded from environment variables.

use std::time::Duration;

/// Default Graph API base URL.
const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// Default template language.
pub const DEFAULT_LANGUAGE_CODE: &str = "es_MX";

/// Default bound on a single gateway call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the WhatsApp Cloud API gateway.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_base: String,
    pub access_token: String,
    pub phone_number_id: String,
    /// Bound on each send, including connect time.
    pub timeout: Duration,
}

impl WhatsAppConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if either credential is missing, signalling that the
    /// dry-run gateway should be used instead.
    ///
    /// | Variable                   | Required | Default                            |
    /// |----------------------------|----------|------------------------------------|
    /// | `WHATSAPP_ACCESS_TOKEN`    | yes      | none                               |
    /// | `WHATSAPP_PHONE_NUMBER_ID` | yes      | none                               |
    /// | `WHATSAPP_API_BASE`        | no       | `https://graph.facebook.com/v19.0` |
    /// | `WHATSAPP_TIMEOUT_SECS`    | no       | `10`                               |
    pub fn from_env() -> Option<Self> {
        let access_token = std::env::var("WHATSAPP_ACCESS_TOKEN").ok()?;
        let phone_number_id = std::env::var("WHATSAPP_PHONE_NUMBER_ID").ok()?;
        Some(Self {
            api_base: std::env::var("WHATSAPP_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            access_token,
            phone_number_id,
            timeout: timeout_from_env(),
        })
    }
}

/// `WHATSAPP_TIMEOUT_SECS`, falling back to [`DEFAULT_TIMEOUT`].
pub fn timeout_from_env() -> Duration {
    std::env::var("WHATSAPP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|secs: &u64| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// `WHATSAPP_LANGUAGE_CODE`, falling back to [`DEFAULT_LANGUAGE_CODE`].
pub fn language_code_from_env() -> String {
    std::env::var("WHATSAPP_LANGUAGE_CODE").unwrap_or_else(|_| DEFAULT_LANGUAGE_CODE.to_string())
}
