//! One-time passcode lifecycle manager.

mod generator;
mod store;

pub mod models;
pub mod service;

pub use models::{
    CooldownDecision, IssueOptions, IssuedOtp, OtpStatus, Purpose, RequestOutcome, Verified,
    VerifyError,
};
pub use service::OtpService;
