//! # passcode
//!
//! In-process issuance and verification of short-lived numeric codes used
//! for email verification, password reset, two-factor, and password-change
//! flows.
//!
//! A single [`OtpService`] holds every live code, keyed by
//! `(identifier, purpose)` with at most one record per pair. Records are
//! consumed on successful verification and purged on expiry or when the
//! attempt ceiling is reached; a background timer reclaims abandoned
//! records. Resend requests for the same pair are held off by a cooldown.
//!
//! The service is deliberately single-process: contents live in memory,
//! are lost on restart, and are not shared across replicas. HTTP routing,
//! email delivery, and persistence belong to the embedding application.
//! Callers relay issued codes over a side channel only and map
//! [`VerifyError::kind`] discriminants to user-facing responses.

pub mod config;
pub mod otp;

pub use config::{ConfigError, OtpConfig};
pub use otp::{
    CooldownDecision, IssueOptions, IssuedOtp, OtpService, OtpStatus, Purpose, RequestOutcome,
    Verified, VerifyError,
};
