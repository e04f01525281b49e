//! Record and outcome types for the OTP lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;
use uuid::Uuid;

/// Why a code was issued. Part of the store key, so each purpose tracks its
/// own live code per identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    EmailVerification,
    PasswordReset,
    TwoFactor,
    PasswordChange,
}

impl Purpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
            Self::TwoFactor => "two_factor",
            Self::PasswordChange => "password_change",
        }
    }

    /// Parse the wire form used by callers (`email_verification`, ...).
    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "email_verification" => Some(Self::EmailVerification),
            "password_reset" => Some(Self::PasswordReset),
            "two_factor" => Some(Self::TwoFactor),
            "password_change" => Some(Self::PasswordChange),
            _ => None,
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live code entry. Internal to the store; callers only ever see derived
/// views that omit the code.
#[derive(Clone, Debug)]
pub(crate) struct OtpRecord {
    pub code: String,
    pub purpose: Purpose,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub attempts: u32,
    pub max_attempts: u32,
    pub user_id: Option<Uuid>,
}

/// Per-call overrides for issuance; unset fields fall back to
/// [`OtpConfig`](crate::config::OtpConfig).
#[derive(Clone, Debug, Default)]
pub struct IssueOptions {
    pub code_length: Option<usize>,
    pub expiry_minutes: Option<u64>,
    pub max_attempts: Option<u32>,
    /// Back-reference to the account, used by the password-change flow.
    pub user_id: Option<Uuid>,
}

/// Result of a successful issuance.
///
/// The code is relayed to the user over a side channel (email); it must
/// never appear in an HTTP response body.
#[derive(Clone, Debug)]
pub struct IssuedOtp {
    pub code: String,
    pub expiry_minutes: u64,
    pub max_attempts: u32,
}

/// Outcome of the resend cooldown check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownDecision {
    Allowed,
    Denied { remaining_seconds: u64 },
}

/// Outcome of the bundled cooldown-check-then-issue operation.
#[derive(Debug)]
pub enum RequestOutcome {
    Issued(IssuedOtp),
    RateLimited { remaining_seconds: u64 },
}

/// Returned on successful verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verified {
    /// Populated when the record was issued with an associated account.
    pub user_id: Option<Uuid>,
}

/// Verification failures, returned as values so callers branch on the
/// discriminant instead of catching panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("no verification code found, request a new one")]
    NotFound,
    #[error("verification code has expired, request a new one")]
    Expired,
    #[error("too many failed attempts, request a new code")]
    MaxAttemptsExceeded,
    #[error("invalid verification code, {attempts_left} attempts left")]
    Invalid { attempts_left: u32 },
}

impl VerifyError {
    /// Stable discriminant for HTTP layers mapping failures to user copy.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::NotFound => "OTP_NOT_FOUND",
            Self::Expired => "OTP_EXPIRED",
            Self::MaxAttemptsExceeded => "MAX_ATTEMPTS_EXCEEDED",
            Self::Invalid { .. } => "INVALID_OTP",
        }
    }
}

/// Read-only view of a live record. Never includes the code.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct OtpStatus {
    pub is_expired: bool,
    pub remaining_seconds: u64,
    pub attempts: u32,
    pub max_attempts: u32,
    pub attempts_left: u32,
}
