//! End-to-end flows through the public API.

use std::time::Duration;
use tokio::time::advance;

use passcode::{
    CooldownDecision, IssueOptions, OtpConfig, OtpService, Purpose, RequestOutcome, VerifyError,
};

fn wrong(code: &str) -> &'static str {
    if code == "000000" {
        "111111"
    } else {
        "000000"
    }
}

#[tokio::test]
async fn email_verification_happy_path() {
    let otp = OtpService::new(OtpConfig::new());

    let issued = match otp
        .request("a@x.com", Purpose::EmailVerification, IssueOptions::default())
        .await
    {
        RequestOutcome::Issued(issued) => issued,
        RequestOutcome::RateLimited { .. } => panic!("first request must issue"),
    };
    assert_eq!(issued.expiry_minutes, 10);
    assert_eq!(issued.max_attempts, 5);

    assert!(otp
        .verify("a@x.com", &issued.code, Purpose::EmailVerification)
        .await
        .is_ok());
    assert_eq!(
        otp.verify("a@x.com", &issued.code, Purpose::EmailVerification)
            .await
            .unwrap_err(),
        VerifyError::NotFound
    );
    otp.shutdown().await;
}

#[tokio::test]
async fn purposes_are_isolated_per_identifier() {
    let otp = OtpService::new(OtpConfig::new());
    let reset = otp
        .issue("a@x.com", Purpose::PasswordReset, IssueOptions::default())
        .await;
    let twofa = otp
        .issue("a@x.com", Purpose::TwoFactor, IssueOptions::default())
        .await;

    // A reset code is useless for the 2FA flow.
    if reset.code != twofa.code {
        assert!(otp
            .verify("a@x.com", &reset.code, Purpose::TwoFactor)
            .await
            .is_err());
    }
    assert!(otp
        .verify("a@x.com", &reset.code, Purpose::PasswordReset)
        .await
        .is_ok());
    assert!(otp
        .verify("a@x.com", &twofa.code, Purpose::TwoFactor)
        .await
        .is_ok());
    otp.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn abandoned_records_are_reclaimed_by_the_timer() {
    let otp = OtpService::new(OtpConfig::new());
    let issued = otp
        .issue("a@x.com", Purpose::EmailVerification, IssueOptions::default())
        .await;
    assert!(otp.status("a@x.com", Purpose::EmailVerification).await.is_some());

    // Well past expiry and the eviction lag; nobody ever verified.
    advance(Duration::from_secs(11 * 60)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    assert!(otp.status("a@x.com", Purpose::EmailVerification).await.is_none());
    assert_eq!(
        otp.verify("a@x.com", &issued.code, Purpose::EmailVerification)
            .await
            .unwrap_err(),
        VerifyError::NotFound
    );
}

#[tokio::test(start_paused = true)]
async fn resend_flow_respects_cooldown_and_invalidates_old_codes() {
    let otp = OtpService::new(OtpConfig::new().with_resend_cooldown_seconds(30));

    let first = otp
        .issue("a@x.com", Purpose::EmailVerification, IssueOptions::default())
        .await;
    match otp.can_request("a@x.com", Purpose::EmailVerification).await {
        CooldownDecision::Denied { remaining_seconds } => assert!(remaining_seconds <= 30),
        CooldownDecision::Allowed => panic!("cooldown must hold right after issuing"),
    }

    advance(Duration::from_secs(31)).await;
    let second = match otp
        .request("a@x.com", Purpose::EmailVerification, IssueOptions::default())
        .await
    {
        RequestOutcome::Issued(issued) => issued,
        RequestOutcome::RateLimited { .. } => panic!("cooldown has elapsed"),
    };

    // Only the newest code is live.
    if first.code != second.code {
        assert!(otp
            .verify("a@x.com", &first.code, Purpose::EmailVerification)
            .await
            .is_err());
    }
    assert!(otp
        .verify("a@x.com", &second.code, Purpose::EmailVerification)
        .await
        .is_ok());
    otp.shutdown().await;
}

#[tokio::test]
async fn brute_force_burns_out_and_account_cleanup_sweeps() {
    let otp = OtpService::new(OtpConfig::new().with_max_attempts(3));

    let issued = otp
        .issue("victim@x.com", Purpose::TwoFactor, IssueOptions::default())
        .await;
    let bad = wrong(&issued.code);

    assert_eq!(
        otp.verify("victim@x.com", bad, Purpose::TwoFactor)
            .await
            .unwrap_err(),
        VerifyError::Invalid { attempts_left: 2 }
    );
    assert_eq!(
        otp.verify("victim@x.com", bad, Purpose::TwoFactor)
            .await
            .unwrap_err(),
        VerifyError::Invalid { attempts_left: 1 }
    );
    assert_eq!(
        otp.verify("victim@x.com", bad, Purpose::TwoFactor)
            .await
            .unwrap_err(),
        VerifyError::MaxAttemptsExceeded
    );
    assert_eq!(
        otp.verify("victim@x.com", &issued.code, Purpose::TwoFactor)
            .await
            .unwrap_err(),
        VerifyError::NotFound
    );

    // Account deletion: drop whatever is still live for the identifier.
    otp.issue("victim@x.com", Purpose::PasswordReset, IssueOptions::default())
        .await;
    otp.issue("bystander@x.com", Purpose::PasswordReset, IssueOptions::default())
        .await;
    assert_eq!(otp.clear_all("victim@x.com").await, 1);
    assert!(otp
        .status("bystander@x.com", Purpose::PasswordReset)
        .await
        .is_some());
    otp.shutdown().await;
}
