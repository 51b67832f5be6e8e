use std::time::Duration;

use cadence_core::vip::DEFAULT_WINDOW_DAYS;
use cadence_messaging::config::{language_code_from_env, timeout_from_env, DEFAULT_LANGUAGE_CODE, DEFAULT_TIMEOUT};

/// Engine tuning loaded from environment variables.
///
/// | Env Var                           | Default |
/// |-----------------------------------|---------|
/// | `AUTOMATION_INACTIVITY_DAYS`      | `30`    |
/// | `AUTOMATION_ACTIVITY_WINDOW_DAYS` | `30`    |
/// | `AUTOMATION_SWEEP_CONCURRENCY`    | `8`     |
/// | `AUTOMATION_POINTS_RETRY_DAYS`    | `7`     |
/// | `WHATSAPP_LANGUAGE_CODE`          | `es_MX` |
/// | `WHATSAPP_TIMEOUT_SECS`           | `10`    |
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Inactivity threshold when neither the rule nor the business sets one.
    pub default_inactivity_days: i64,
    /// Length of the VIP "monthly" window.
    pub activity_window_days: i64,
    /// Customers evaluated in parallel within one sweep.
    pub sweep_concurrency: usize,
    /// How far back the points sweep looks for failed notifications.
    pub points_retry_days: i64,
    /// Template language when the business has none.
    pub language_code: String,
    /// Bound on each gateway call.
    pub gateway_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_inactivity_days: DEFAULT_WINDOW_DAYS,
            activity_window_days: DEFAULT_WINDOW_DAYS,
            sweep_concurrency: 8,
            points_retry_days: 7,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            gateway_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_inactivity_days: positive_env("AUTOMATION_INACTIVITY_DAYS")
                .unwrap_or(defaults.default_inactivity_days),
            activity_window_days: positive_env("AUTOMATION_ACTIVITY_WINDOW_DAYS")
                .unwrap_or(defaults.activity_window_days),
            sweep_concurrency: positive_env("AUTOMATION_SWEEP_CONCURRENCY")
                .map(|n| n as usize)
                .unwrap_or(defaults.sweep_concurrency),
            points_retry_days: positive_env("AUTOMATION_POINTS_RETRY_DAYS")
                .unwrap_or(defaults.points_retry_days),
            language_code: language_code_from_env(),
            gateway_timeout: timeout_from_env(),
        }
    }
}

fn positive_env(name: &str) -> Option<i64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
}
