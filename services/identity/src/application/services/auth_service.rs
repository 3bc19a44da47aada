//! Sign-in, sign-up and credential management
//!
//! Orchestrates accounts, OTP issuance, the wallet and token issuance. Input
//! arrives already parsed into value objects; handlers do the parsing.

use std::sync::Arc;

use bhada_auth_core::{TokenPair, TokenService};
use bhada_common::UserId;
use bhada_errors::AppError;
use metrics::counter;
use tracing::{info, warn};

use crate::application::dto::{AccountDto, AuthSession};
use crate::domain::account::{Account, AccountRole};
use crate::domain::auth_flow::{AuthStep, EmailCheck};
use crate::domain::otp::{Identifier, OtpPurpose};
use crate::domain::repositories::AccountRepository;
use crate::domain::services::{IssuedCode, OtpService, WalletService};
use crate::domain::value_objects::{Email, HashedPassword, Phone};
use crate::domain::wallet::CoinReason;
use crate::error::{AuthError, AuthResult};

pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    otp: Arc<OtpService>,
    wallet: Arc<WalletService>,
    tokens: Arc<TokenService>,
    welcome_bonus: i64,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        otp: Arc<OtpService>,
        wallet: Arc<WalletService>,
        tokens: Arc<TokenService>,
        welcome_bonus: i64,
    ) -> Self {
        Self {
            accounts,
            otp,
            wallet,
            tokens,
            welcome_bonus,
        }
    }

    pub async fn check_email(&self, email: &Email) -> AuthResult<EmailCheck> {
        let account = self.accounts.find_by_email(email).await?;
        Ok(EmailCheck {
            exists: account.is_some(),
            has_password: account.is_some_and(|a| a.has_password()),
        })
    }

    pub async fn send_otp(&self, email: &Email, purpose: OtpPurpose) -> AuthResult<IssuedCode> {
        self.check_email_purpose(email, purpose).await?;
        self.otp
            .request_code(&Identifier::Email(email.clone()), purpose)
            .await
    }

    pub async fn resend_otp(&self, email: &Email, purpose: OtpPurpose) -> AuthResult<IssuedCode> {
        self.check_email_purpose(email, purpose).await?;
        self.otp
            .resend_code(&Identifier::Email(email.clone()), purpose)
            .await
    }

    /// Passwordless sign-in. Creates the account on first use.
    pub async fn verify_otp(&self, email: &Email, code: &str) -> AuthResult<AuthSession> {
        self.otp
            .verify_code(
                &Identifier::Email(email.clone()),
                code,
                OtpPurpose::Registration,
            )
            .await?;

        let (account, is_new_user) = match self.accounts.find_by_email(email).await? {
            Some(account) => (account, false),
            None => self.create_passwordless(email).await?,
        };

        let welcome_bonus = if is_new_user {
            self.credit_welcome_bonus(&account.id).await
        } else {
            self.reconcile_welcome_bonus(&account.id).await
        };

        let needs_password_setup = !account.has_password();
        info!(user_id = %account.id, is_new_user, "Signed in with OTP");

        self.session(
            &account,
            is_new_user,
            welcome_bonus,
            needs_password_setup,
            AuthStep::after_otp(needs_password_setup),
        )
    }

    /// Sign-up with a password. The code is only consumed once the password
    /// passes the policy.
    pub async fn register(
        &self,
        email: &Email,
        name: Option<String>,
        password: &str,
        code: &str,
        role: AccountRole,
    ) -> AuthResult<AuthSession> {
        if self.accounts.find_by_email(email).await?.is_some() {
            return Err(AuthError::AccountExists);
        }

        let password_hash = HashedPassword::from_plain_async(password).await?;

        self.otp
            .verify_code(
                &Identifier::Email(email.clone()),
                code,
                OtpPurpose::Registration,
            )
            .await?;

        let account = Account::new(email.clone(), role)
            .with_name(name)
            .with_password(password_hash);

        self.accounts
            .create(&account)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AuthError::AccountExists,
                other => AuthError::Infra(other),
            })?;

        let welcome_bonus = self.credit_welcome_bonus(&account.id).await;
        info!(user_id = %account.id, role = %account.role, "Account registered");

        self.session(&account, true, welcome_bonus, false, None)
    }

    pub async fn login(&self, email: &Email, password: &str) -> AuthResult<AuthSession> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(password_hash) = &account.password_hash else {
            return Err(AuthError::EmailVerificationRequired);
        };

        if !password_hash.verify_async(password).await? {
            warn!(user_id = %account.id, "Password sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let welcome_bonus = self.reconcile_welcome_bonus(&account.id).await;
        info!(user_id = %account.id, "Signed in with password");
        self.session(&account, false, welcome_bonus, false, None)
    }

    pub async fn set_password(&self, user_id: &UserId, password: &str) -> AuthResult<Account> {
        let password_hash = HashedPassword::from_plain_async(password).await?;
        let mut account = self.account(user_id).await?;

        account.set_password(password_hash);
        self.accounts.update(&account).await?;

        info!(user_id = %user_id, "Password set");
        Ok(account)
    }

    pub async fn reset_password(
        &self,
        email: &Email,
        code: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let password_hash = HashedPassword::from_plain_async(new_password).await?;

        let mut account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        self.otp
            .verify_code(
                &Identifier::Email(email.clone()),
                code,
                OtpPurpose::ForgotPassword,
            )
            .await?;

        account.reset_password(password_hash);
        self.accounts.update(&account).await?;

        info!(user_id = %account.id, "Password reset");
        Ok(())
    }

    pub async fn send_phone_code(&self, user_id: &UserId, phone: &Phone) -> AuthResult<IssuedCode> {
        let account = self.account(user_id).await?;

        let issued = self
            .otp
            .request_code(
                &Identifier::Phone(phone.clone()),
                OtpPurpose::PhoneVerification,
            )
            .await?;

        info!(user_id = %account.id, "Phone verification code sent");
        Ok(issued)
    }

    pub async fn verify_phone(
        &self,
        user_id: &UserId,
        phone: &Phone,
        code: &str,
    ) -> AuthResult<Account> {
        let mut account = self.account(user_id).await?;

        self.otp
            .verify_code(
                &Identifier::Phone(phone.clone()),
                code,
                OtpPurpose::PhoneVerification,
            )
            .await?;

        account.verify_phone(phone.clone());
        self.accounts.update(&account).await?;

        info!(user_id = %user_id, "Phone verified");
        Ok(account)
    }

    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self
            .tokens
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidToken)?;
        let user_id = claims.user_id().map_err(|_| AuthError::InvalidToken)?;

        let account = self
            .accounts
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(self.tokens.issue_pair(&account.id, account.role.as_str())?)
    }

    pub async fn account(&self, user_id: &UserId) -> AuthResult<Account> {
        self.accounts
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    async fn check_email_purpose(&self, email: &Email, purpose: OtpPurpose) -> AuthResult<()> {
        match purpose {
            OtpPurpose::Registration => Ok(()),
            OtpPurpose::ForgotPassword => {
                if self.accounts.find_by_email(email).await?.is_none() {
                    return Err(AuthError::AccountNotFound);
                }
                Ok(())
            }
            OtpPurpose::PhoneVerification => Err(AuthError::Validation(
                "Phone verification codes are sent to a phone number".to_string(),
            )),
        }
    }

    async fn create_passwordless(&self, email: &Email) -> AuthResult<(Account, bool)> {
        let account = Account::new(email.clone(), AccountRole::default());

        match self.accounts.create(&account).await {
            Ok(()) => Ok((account, true)),
            // Lost a race with a concurrent sign-up for the same address
            Err(AppError::Conflict(_)) => {
                let existing = self
                    .accounts
                    .find_by_email(email)
                    .await?
                    .ok_or(AuthError::AccountNotFound)?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn credit_welcome_bonus(&self, user_id: &UserId) -> Option<i64> {
        if self.welcome_bonus <= 0 {
            return None;
        }

        match self
            .wallet
            .award(user_id, self.welcome_bonus, CoinReason::WelcomeBonus)
            .await
        {
            Ok(transaction) => Some(transaction.amount),
            Err(e) => {
                counter!("wallet_bonus_failures_total").increment(1);
                warn!(user_id = %user_id, error = %e, "Failed to credit welcome bonus");
                None
            }
        }
    }

    /// Credit a welcome bonus that an earlier sign-up failed to record
    async fn reconcile_welcome_bonus(&self, user_id: &UserId) -> Option<i64> {
        if self.welcome_bonus <= 0 {
            return None;
        }

        match self.wallet.has_credit(user_id, CoinReason::WelcomeBonus).await {
            Ok(true) => None,
            Ok(false) => {
                let credited = self.credit_welcome_bonus(user_id).await;
                if credited.is_some() {
                    info!(user_id = %user_id, "Missing welcome bonus credited");
                }
                credited
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to read wallet for bonus check");
                None
            }
        }
    }

    fn session(
        &self,
        account: &Account,
        is_new_user: bool,
        welcome_bonus: Option<i64>,
        needs_password_setup: bool,
        next_step: Option<AuthStep>,
    ) -> AuthResult<AuthSession> {
        let tokens = self.tokens.issue_pair(&account.id, account.role.as_str())?;
        Ok(AuthSession {
            user: AccountDto::from(account),
            tokens,
            is_new_user,
            welcome_bonus,
            needs_password_setup,
            next_step,
        })
    }
}
