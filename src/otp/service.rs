//! OTP lifecycle: issuance, resend cooldown, verification, introspection.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::OtpConfig;

use super::generator;
use super::models::{
    CooldownDecision, IssueOptions, IssuedOtp, OtpRecord, OtpStatus, Purpose, RequestOutcome,
    Verified, VerifyError,
};
use super::store::{Key, OtpStore, Verdict};

/// One-time passcode service.
///
/// Construct one instance at process start and hand it to callers by
/// reference; all state lives inside, nothing is module-global. Call
/// [`shutdown`](Self::shutdown) when tearing down (tests, graceful exit) so
/// pending eviction timers are cancelled rather than left parked.
///
/// All operations are single-process: the store is not shared across
/// instances, so running more than one replica breaks the one-live-record
/// guarantee per (identifier, purpose).
pub struct OtpService {
    config: OtpConfig,
    store: OtpStore,
}

impl OtpService {
    #[must_use]
    pub fn new(config: OtpConfig) -> Self {
        Self {
            config,
            store: OtpStore::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Issue a fresh code for `(identifier, purpose)`.
    ///
    /// Always succeeds; any previous record for the pair is replaced and
    /// its eviction timer restarted. Callers wanting the resend cooldown
    /// enforced should use [`request`](Self::request) instead of composing
    /// [`can_request`](Self::can_request) by hand.
    pub async fn issue(
        &self,
        identifier: &str,
        purpose: Purpose,
        options: IssueOptions,
    ) -> IssuedOtp {
        let code_length = options.code_length.unwrap_or(self.config.code_length());
        let expiry_minutes = options
            .expiry_minutes
            .unwrap_or(self.config.expiry_minutes());
        let max_attempts = options.max_attempts.unwrap_or(self.config.max_attempts());

        let code = generator::numeric_code(code_length);
        let now = Instant::now();
        let record = OtpRecord {
            code: code.clone(),
            purpose,
            created_at: now,
            expires_at: now + Duration::from_secs(expiry_minutes * 60),
            attempts: 0,
            max_attempts,
            user_id: options.user_id,
        };
        self.store.put(key(identifier, purpose), record).await;
        debug!(identifier, %purpose, expiry_minutes, "issued code");

        IssuedOtp {
            code,
            expiry_minutes,
            max_attempts,
        }
    }

    /// Resend cooldown check: denied while the live record for the pair is
    /// younger than the configured cooldown, with the remaining wait
    /// reported in whole seconds (rounded up, so a denial is never `0`).
    pub async fn can_request(&self, identifier: &str, purpose: Purpose) -> CooldownDecision {
        match self.store.get(&key(identifier, purpose)).await {
            None => CooldownDecision::Allowed,
            Some(record) => {
                let elapsed = record.created_at.elapsed();
                let cooldown = self.config.resend_cooldown();
                if elapsed < cooldown {
                    CooldownDecision::Denied {
                        remaining_seconds: ceil_seconds(cooldown - elapsed),
                    }
                } else {
                    CooldownDecision::Allowed
                }
            }
        }
    }

    /// Cooldown check and issuance in one call, so callers cannot forget
    /// the check. Returns the remaining wait when denied.
    pub async fn request(
        &self,
        identifier: &str,
        purpose: Purpose,
        options: IssueOptions,
    ) -> RequestOutcome {
        match self.can_request(identifier, purpose).await {
            CooldownDecision::Denied { remaining_seconds } => {
                debug!(identifier, %purpose, remaining_seconds, "request denied by cooldown");
                RequestOutcome::RateLimited { remaining_seconds }
            }
            CooldownDecision::Allowed => {
                RequestOutcome::Issued(self.issue(identifier, purpose, options).await)
            }
        }
    }

    /// Check a submitted code against the live record for the pair.
    ///
    /// The record is deleted on success, on expiry, and on exhausting the
    /// attempt ceiling; a plain mismatch below the ceiling keeps it live
    /// and reports how many attempts remain. Expiry is checked before the
    /// code, so a correct-but-late submission is rejected like any other.
    ///
    /// # Errors
    /// `VerifyError` carries the failure taxonomy; see
    /// [`VerifyError::kind`] for the stable discriminants.
    pub async fn verify(
        &self,
        identifier: &str,
        code: &str,
        purpose: Purpose,
    ) -> Result<Verified, VerifyError> {
        let now = Instant::now();
        let outcome = self
            .store
            .update(&key(identifier, purpose), |record| {
                // A record at the ceiling behaves as absent.
                if record.attempts >= record.max_attempts {
                    return (Verdict::Remove, Err(VerifyError::NotFound));
                }
                if now > record.expires_at {
                    return (Verdict::Remove, Err(VerifyError::Expired));
                }
                record.attempts += 1;
                if record.code == code {
                    (
                        Verdict::Remove,
                        Ok(Verified {
                            user_id: record.user_id,
                        }),
                    )
                } else if record.attempts >= record.max_attempts {
                    (Verdict::Remove, Err(VerifyError::MaxAttemptsExceeded))
                } else {
                    (
                        Verdict::Keep,
                        Err(VerifyError::Invalid {
                            attempts_left: record.max_attempts - record.attempts,
                        }),
                    )
                }
            })
            .await;

        let result = outcome.unwrap_or(Err(VerifyError::NotFound));
        match &result {
            Ok(_) => debug!(identifier, %purpose, "code verified"),
            Err(VerifyError::MaxAttemptsExceeded) => {
                warn!(identifier, %purpose, "attempt ceiling reached, record purged");
            }
            Err(err) => debug!(identifier, %purpose, kind = err.kind(), "verification failed"),
        }
        result
    }

    /// Report the state of the live record without mutating it or exposing
    /// the code. `None` when no record exists for the pair.
    pub async fn status(&self, identifier: &str, purpose: Purpose) -> Option<OtpStatus> {
        let record = self.store.get(&key(identifier, purpose)).await?;
        let now = Instant::now();
        Some(OtpStatus {
            is_expired: now > record.expires_at,
            remaining_seconds: record.expires_at.saturating_duration_since(now).as_secs(),
            attempts: record.attempts,
            max_attempts: record.max_attempts,
            attempts_left: record.max_attempts.saturating_sub(record.attempts),
        })
    }

    /// Remove every record for `identifier` across all purposes, e.g. on
    /// account deletion. Returns the number of records cleared.
    pub async fn clear_all(&self, identifier: &str) -> usize {
        let cleared = self.store.clear_identifier(identifier).await;
        if cleared > 0 {
            debug!(identifier, cleared, "cleared records");
        }
        cleared
    }

    /// Drop all records and cancel their eviction timers.
    pub async fn shutdown(&self) {
        self.store.shutdown().await;
    }
}

fn key(identifier: &str, purpose: Purpose) -> Key {
    (identifier.to_string(), purpose)
}

/// Whole seconds, rounded up so a non-zero wait never reports as zero.
fn ceil_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
