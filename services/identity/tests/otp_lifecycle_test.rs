//! OTP issuance, verification and throttling against in-memory storage

mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use bhada_identity::AuthError;
use bhada_identity::domain::otp::{Identifier, OtpCode, OtpError, OtpPurpose, OtpRecord};
use bhada_identity::domain::repositories::OtpRepository;
use bhada_identity::domain::services::OtpPolicy;
use bhada_identity::infrastructure::cleanup::CleanupTask;
use chrono::{Duration, Utc};
use common::{TestApp, extract_code};

const EMAIL: &str = "asha@example.com";

fn email() -> Identifier {
    Identifier::parse(EMAIL).unwrap()
}

/// Six-digit codes that differ from `code`
fn wrong_codes(code: &str) -> impl Iterator<Item = String> + '_ {
    (0..10u32)
        .map(|d| d.to_string().repeat(6))
        .filter(move |guess| guess != code)
}

#[test]
fn test_extract_code() {
    assert_eq!(
        extract_code("Use 482913 to sign in on Bhada. The code expires in 10 minutes."),
        Some("482913".to_string())
    );
    assert_eq!(extract_code("expires in 10 minutes"), None);
    assert_eq!(extract_code("call 9876543210"), None);
}

#[tokio::test]
async fn test_code_verifies_exactly_once() {
    let app = TestApp::new();
    let otp = &app.services.otp;

    let issued = otp.request_code(&email(), OtpPurpose::Registration).await.unwrap();
    assert_eq!(issued.expires_in_secs, 600);

    let code = app.emails.last_code_for(EMAIL);
    assert_eq!(code.len(), 6);

    let record = otp
        .verify_code(&email(), &code, OtpPurpose::Registration)
        .await
        .unwrap();
    assert_eq!(record.id, issued.otp_id);

    let again = otp.verify_code(&email(), &code, OtpPurpose::Registration).await;
    assert!(matches!(again, Err(AuthError::InvalidOtp)));

    let stored = app.otp_records.all().await;
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_used);
}

#[tokio::test]
async fn test_code_is_stored_hashed() {
    let app = TestApp::new();
    app.services
        .otp
        .request_code(&email(), OtpPurpose::Registration)
        .await
        .unwrap();

    let code = app.emails.last_code_for(EMAIL);
    let stored = app.otp_records.all().await;
    assert_ne!(stored[0].code_hash, code);
    assert_eq!(stored[0].code_hash, OtpRecord::hash_code(&code));
}

#[tokio::test]
async fn test_wrong_code_is_rejected_and_keeps_the_record_usable() {
    let app = TestApp::new();
    let otp = &app.services.otp;

    otp.request_code(&email(), OtpPurpose::Registration).await.unwrap();
    let code = app.emails.last_code_for(EMAIL);
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let result = otp.verify_code(&email(), wrong, OtpPurpose::Registration).await;
    assert!(matches!(result, Err(AuthError::InvalidOtp)));

    otp.verify_code(&email(), &code, OtpPurpose::Registration)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_spent_attempts_lock_the_code() {
    let app = TestApp::new();
    let otp = &app.services.otp;
    let max_attempts = otp.policy().max_attempts;

    otp.request_code(&email(), OtpPurpose::ForgotPassword).await.unwrap();
    let code = app.emails.last_code_for(EMAIL);

    for guess in wrong_codes(&code).take(max_attempts as usize) {
        let result = otp.verify_code(&email(), &guess, OtpPurpose::ForgotPassword).await;
        assert!(matches!(result, Err(AuthError::InvalidOtp)));
    }

    let result = otp.verify_code(&email(), &code, OtpPurpose::ForgotPassword).await;
    assert!(matches!(result, Err(AuthError::InvalidOtp)));

    let stored = app.otp_records.all().await;
    assert_eq!(stored[0].attempts, max_attempts);
    assert!(!stored[0].is_used);

    // A fresh code starts with a full budget
    otp.request_code(&email(), OtpPurpose::ForgotPassword).await.unwrap();
    let fresh = app.emails.last_code_for(EMAIL);
    otp.verify_code(&email(), &fresh, OtpPurpose::ForgotPassword)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_code_is_bound_to_its_purpose() {
    let app = TestApp::new();
    let otp = &app.services.otp;

    otp.request_code(&email(), OtpPurpose::Registration).await.unwrap();
    let code = app.emails.last_code_for(EMAIL);

    let result = otp.verify_code(&email(), &code, OtpPurpose::ForgotPassword).await;
    assert!(matches!(result, Err(AuthError::InvalidOtp)));

    otp.verify_code(&email(), &code, OtpPurpose::Registration)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_code_is_bound_to_its_identifier() {
    let app = TestApp::new();
    let otp = &app.services.otp;

    otp.request_code(&email(), OtpPurpose::Registration).await.unwrap();
    let code = app.emails.last_code_for(EMAIL);

    let other = Identifier::parse("someone-else@example.com").unwrap();
    let result = otp.verify_code(&other, &code, OtpPurpose::Registration).await;
    assert!(matches!(result, Err(AuthError::InvalidOtp)));
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let app = TestApp::new();
    let issued_at = Utc::now() - Duration::minutes(11);
    let record = OtpRecord::new(
        email(),
        OtpPurpose::Registration,
        &OtpCode::from("123456"),
        Duration::minutes(10),
        issued_at,
    );
    app.storage.otp.save(&record).await.unwrap();

    let result = app
        .services
        .otp
        .verify_code(&email(), "123456", OtpPurpose::Registration)
        .await;
    assert!(matches!(result, Err(AuthError::InvalidOtp)));
}

#[tokio::test]
async fn test_new_code_supersedes_the_previous_one() {
    let app = TestApp::new();
    let otp = &app.services.otp;

    otp.request_code(&email(), OtpPurpose::Registration).await.unwrap();
    let first = app.emails.last_code_for(EMAIL);
    let second_issue = otp.request_code(&email(), OtpPurpose::Registration).await.unwrap();
    let second = app.emails.last_code_for(EMAIL);

    let stored = app.otp_records.all().await;
    assert_eq!(stored.len(), 2);
    assert!(stored[1].invalidated_at.is_none());
    assert_eq!(
        stored[0].check(&first, OtpPurpose::Registration, Utc::now()),
        Err(OtpError::Superseded)
    );

    let record = otp
        .verify_code(&email(), &second, OtpPurpose::Registration)
        .await
        .unwrap();
    assert_eq!(record.id, second_issue.otp_id);

    let result = otp.verify_code(&email(), &first, OtpPurpose::Registration).await;
    assert!(matches!(result, Err(AuthError::InvalidOtp)));
}

#[tokio::test]
async fn test_resend_inside_cooldown_is_refused() {
    let app = TestApp::with_policy(OtpPolicy {
        code_ttl: Duration::minutes(10),
        resend_cooldown: Duration::seconds(60),
        max_requests_per_hour: 5,
        ..OtpPolicy::default()
    });
    let otp = &app.services.otp;

    let issued = otp.request_code(&email(), OtpPurpose::Registration).await.unwrap();
    assert_eq!(issued.resend_after_secs, 60);

    let result = otp.resend_code(&email(), OtpPurpose::Registration).await;
    match result {
        Err(AuthError::OtpCooldown { retry_after_secs }) => {
            assert!(retry_after_secs > 0 && retry_after_secs <= 60);
        }
        other => panic!("expected cooldown, got {other:?}"),
    }

    // A different purpose has its own cooldown
    otp.request_code(&email(), OtpPurpose::ForgotPassword)
        .await
        .unwrap();
    assert_eq!(app.emails.sent().len(), 2);
}

#[tokio::test]
async fn test_hourly_cap() {
    let app = TestApp::with_policy(OtpPolicy {
        code_ttl: Duration::minutes(10),
        resend_cooldown: Duration::zero(),
        max_requests_per_hour: 3,
        ..OtpPolicy::default()
    });
    let otp = &app.services.otp;

    for _ in 0..3 {
        otp.request_code(&email(), OtpPurpose::Registration).await.unwrap();
    }

    let result = otp.request_code(&email(), OtpPurpose::Registration).await;
    match result {
        Err(AuthError::OtpRateLimited { retry_after_secs }) => assert_eq!(retry_after_secs, 3600),
        other => panic!("expected rate limit, got {other:?}"),
    }
    assert_eq!(app.emails.sent().len(), 3);
}

#[tokio::test]
async fn test_failed_delivery_discards_the_code() {
    let app = TestApp::with_failing_email();

    let result = app
        .services
        .otp
        .request_code(&email(), OtpPurpose::Registration)
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, AuthError::DeliveryFailed(_)));
    assert_eq!(err.status_code(), 502);

    assert!(app.otp_records.all().await.is_empty());
}

#[tokio::test]
async fn test_phone_codes_go_over_sms() {
    let app = TestApp::new();
    let phone = Identifier::parse("+91 98765 43210").unwrap();

    app.services
        .otp
        .request_code(&phone, OtpPurpose::PhoneVerification)
        .await
        .unwrap();

    assert!(app.emails.sent().is_empty());
    let code = app.sms.last_code_for("+919876543210");
    app.services
        .otp
        .verify_code(&phone, &code, OtpPurpose::PhoneVerification)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cleanup_removes_only_expired_records() {
    let app = TestApp::new();
    let stale = OtpRecord::new(
        email(),
        OtpPurpose::ForgotPassword,
        &OtpCode::from("654321"),
        Duration::minutes(10),
        Utc::now() - Duration::hours(2),
    );
    app.storage.otp.save(&stale).await.unwrap();
    app.services
        .otp
        .request_code(&email(), OtpPurpose::Registration)
        .await
        .unwrap();

    let task = CleanupTask::new(Arc::clone(&app.services.otp), StdDuration::from_secs(60));
    assert_eq!(task.run_once().await, 1);
    assert_eq!(task.run_once().await, 0);

    let remaining = app.otp_records.all().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].purpose, OtpPurpose::Registration);
}

#[tokio::test]
async fn test_cleanup_keeps_expired_records_inside_the_rate_window() {
    let app = TestApp::with_policy(OtpPolicy {
        resend_cooldown: Duration::zero(),
        max_requests_per_hour: 2,
        ..OtpPolicy::default()
    });
    for code in ["111111", "222222"] {
        let expired = OtpRecord::new(
            email(),
            OtpPurpose::Registration,
            &OtpCode::from(code),
            Duration::minutes(10),
            Utc::now() - Duration::minutes(20),
        );
        app.storage.otp.save(&expired).await.unwrap();
    }

    assert_eq!(app.services.otp.cleanup_expired(Utc::now()).await.unwrap(), 0);

    let result = app
        .services
        .otp
        .request_code(&email(), OtpPurpose::Registration)
        .await;
    assert!(matches!(result, Err(AuthError::OtpRateLimited { .. })));
    assert!(app.emails.sent().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_respect_the_cooldown() {
    let app = TestApp::with_policy(OtpPolicy {
        resend_cooldown: Duration::seconds(60),
        max_requests_per_hour: 0,
        ..OtpPolicy::default()
    });

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let otp = Arc::clone(&app.services.otp);
            tokio::spawn(async move { otp.request_code(&email(), OtpPurpose::Registration).await })
        })
        .collect();

    let mut issued = 0;
    let mut cooled_down = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => issued += 1,
            Err(AuthError::OtpCooldown { .. }) => cooled_down += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(issued, 1);
    assert_eq!(cooled_down, 15);
    assert_eq!(app.otp_records.all().await.len(), 1);
    assert_eq!(app.emails.sent().len(), 1);
}
