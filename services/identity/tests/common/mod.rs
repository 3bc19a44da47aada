//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bhada_adapter_email::EmailSender;
use bhada_auth_core::TokenService;
use bhada_errors::{AppError, AppResult};
use bhada_identity::api::http::router;
use bhada_identity::bootstrap::{Services, Storage};
use bhada_common::UserId;
use bhada_identity::domain::repositories::WalletRepository;
use bhada_identity::domain::services::{OtpPolicy, SmsSender};
use bhada_identity::domain::wallet::CoinTransaction;
use bhada_identity::infrastructure::notification::ChannelOtpNotifier;
use bhada_identity::infrastructure::persistence::memory::{
    InMemoryAccountRepository, InMemoryOtpRepository, InMemoryWalletRepository, MemoryProbe,
};
use chrono::Duration;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const WELCOME_BONUS: i64 = 100;

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Code from the newest mail sent to `to`
    pub fn last_code_for(&self, to: &str) -> String {
        let sent = self.sent.lock().unwrap();
        let message = sent
            .iter()
            .rev()
            .find(|m| m.to == to)
            .unwrap_or_else(|| panic!("no mail sent to {to}"));
        extract_code(&message.body).expect("mail should carry a code")
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> AppResult<()> {
        self.send_text_email(to, subject, text_body.unwrap_or(html_body))
            .await
    }
}

pub struct FailingEmailSender;

#[async_trait]
impl EmailSender for FailingEmailSender {
    async fn send_text_email(&self, _to: &str, _subject: &str, _body: &str) -> AppResult<()> {
        Err(AppError::external_service("SMTP relay unavailable"))
    }

    async fn send_html_email(
        &self,
        _to: &str,
        _subject: &str,
        _html_body: &str,
        _text_body: Option<&str>,
    ) -> AppResult<()> {
        Err(AppError::external_service("SMTP relay unavailable"))
    }
}

#[derive(Default)]
pub struct RecordingSmsSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSmsSender {
    pub fn last_code_for(&self, phone: &str) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, message) = sent
            .iter()
            .rev()
            .find(|(to, _)| to == phone)
            .unwrap_or_else(|| panic!("no SMS sent to {phone}"));
        extract_code(message).expect("SMS should carry a code")
    }
}

#[async_trait]
impl SmsSender for RecordingSmsSender {
    async fn send_sms(&self, phone: &str, message: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }
}

/// First run of exactly six digits
pub fn extract_code(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0;
    while start < chars.len() {
        if !chars[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        if end - start == 6 {
            return Some(chars[start..end].iter().collect());
        }
        start = end;
    }
    None
}

pub fn token_service() -> TokenService {
    TokenService::new(
        JWT_SECRET,
        3600,
        86400,
        "bhada-identity".to_string(),
        "bhada-web".to_string(),
    )
}

/// Ledger whose first `failures` appends fail
pub struct FlakyWalletRepository {
    inner: InMemoryWalletRepository,
    failures: AtomicUsize,
}

impl FlakyWalletRepository {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            inner: InMemoryWalletRepository::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl WalletRepository for FlakyWalletRepository {
    async fn append(&self, transaction: &CoinTransaction) -> AppResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::database("ledger unavailable"));
        }
        self.inner.append(transaction).await
    }

    async fn list_by_user(&self, user_id: &UserId) -> AppResult<Vec<CoinTransaction>> {
        self.inner.list_by_user(user_id).await
    }
}

/// Policy without throttling, so tests can request codes back to back
pub fn relaxed_policy() -> OtpPolicy {
    OtpPolicy {
        code_ttl: Duration::minutes(10),
        resend_cooldown: Duration::zero(),
        max_requests_per_hour: 0,
        max_attempts: 5,
    }
}

pub struct TestApp {
    pub storage: Storage,
    pub services: Services,
    pub otp_records: Arc<InMemoryOtpRepository>,
    pub emails: Arc<RecordingEmailSender>,
    pub sms: Arc<RecordingSmsSender>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(relaxed_policy())
    }

    pub fn with_policy(policy: OtpPolicy) -> Self {
        let emails = Arc::new(RecordingEmailSender::default());
        Self::build(policy, emails.clone(), emails, Arc::new(InMemoryWalletRepository::new()))
    }

    /// Every email delivery fails
    pub fn with_failing_email() -> Self {
        Self::build(
            relaxed_policy(),
            Arc::new(FailingEmailSender),
            Arc::new(RecordingEmailSender::default()),
            Arc::new(InMemoryWalletRepository::new()),
        )
    }

    pub fn with_wallet(wallet: Arc<dyn WalletRepository>) -> Self {
        let emails = Arc::new(RecordingEmailSender::default());
        Self::build(relaxed_policy(), emails.clone(), emails, wallet)
    }

    fn build(
        policy: OtpPolicy,
        email_sender: Arc<dyn EmailSender>,
        emails: Arc<RecordingEmailSender>,
        wallet: Arc<dyn WalletRepository>,
    ) -> Self {
        let otp_records = Arc::new(InMemoryOtpRepository::new());
        let storage = Storage {
            otp: otp_records.clone(),
            accounts: Arc::new(InMemoryAccountRepository::new()),
            wallet,
            probe: Arc::new(MemoryProbe),
        };

        let sms = Arc::new(RecordingSmsSender::default());
        let notifier = Arc::new(ChannelOtpNotifier::new(email_sender, sms.clone(), "Bhada"));
        let services = Services::new(&storage, notifier, token_service(), policy, WELCOME_BONUS);

        Self {
            storage,
            services,
            otp_records,
            emails,
            sms,
        }
    }

    pub fn router(&self) -> axum::Router {
        router(self.services.state(&self.storage, None), &[])
    }
}
