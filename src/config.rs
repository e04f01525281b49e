//! Service configuration with environment overrides.

use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CODE_LENGTH: usize = 6;
const DEFAULT_EXPIRY_MINUTES: u64 = 10;
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_RESEND_COOLDOWN_SECONDS: u64 = 2 * 60;

const ENV_CODE_LENGTH: &str = "PASSCODE_CODE_LENGTH";
const ENV_EXPIRY_MINUTES: &str = "PASSCODE_EXPIRY_MINUTES";
const ENV_MAX_ATTEMPTS: &str = "PASSCODE_MAX_ATTEMPTS";
const ENV_RESEND_COOLDOWN_SECONDS: &str = "PASSCODE_RESEND_COOLDOWN_SECONDS";

/// A configuration variable was set but could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {key}")]
pub struct ConfigError {
    key: &'static str,
    value: String,
}

/// Defaults for code length, expiry, attempt ceiling, and resend cooldown.
///
/// Every field can be overridden per issuance call via
/// [`IssueOptions`](crate::otp::models::IssueOptions).
#[derive(Clone, Debug)]
pub struct OtpConfig {
    code_length: usize,
    expiry_minutes: u64,
    max_attempts: u32,
    resend_cooldown_seconds: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            expiry_minutes: DEFAULT_EXPIRY_MINUTES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            resend_cooldown_seconds: DEFAULT_RESEND_COOLDOWN_SECONDS,
        }
    }
}

impl OtpConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `PASSCODE_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` when a variable is set but not a valid number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(length) = parse_var(ENV_CODE_LENGTH)? {
            config.code_length = length;
        }
        if let Some(minutes) = parse_var(ENV_EXPIRY_MINUTES)? {
            config.expiry_minutes = minutes;
        }
        if let Some(attempts) = parse_var(ENV_MAX_ATTEMPTS)? {
            config.max_attempts = attempts;
        }
        if let Some(seconds) = parse_var(ENV_RESEND_COOLDOWN_SECONDS)? {
            config.resend_cooldown_seconds = seconds;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_code_length(mut self, length: usize) -> Self {
        self.code_length = length;
        self
    }

    #[must_use]
    pub fn with_expiry_minutes(mut self, minutes: u64) -> Self {
        self.expiry_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_resend_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    #[must_use]
    pub fn expiry_minutes(&self) -> u64 {
        self.expiry_minutes
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn resend_cooldown_seconds(&self) -> u64 {
        self.resend_cooldown_seconds
    }

    pub(crate) fn resend_cooldown(&self) -> Duration {
        Duration::from_secs(self.resend_cooldown_seconds)
    }
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError { key, value }),
        Err(_) => Ok(None),
    }
}
