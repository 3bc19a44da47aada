//! Query handlers

use std::sync::Arc;

use async_trait::async_trait;
use bhada_cqrs_core::QueryHandler;

use crate::application::dto::{AccountDto, EmailCheckResult};
use crate::application::queries::{CheckEmailQuery, GetAccountQuery, GetWalletQuery};
use crate::application::services::AuthService;
use crate::domain::services::{WalletService, WalletSummary};
use crate::domain::value_objects::Email;
use crate::error::AuthError;

pub struct AccountQueryHandler {
    auth: Arc<AuthService>,
}

impl AccountQueryHandler {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl QueryHandler<CheckEmailQuery> for AccountQueryHandler {
    type Error = AuthError;

    async fn handle(&self, query: CheckEmailQuery) -> Result<EmailCheckResult, AuthError> {
        let email = Email::new(query.email)?;
        Ok(self.auth.check_email(&email).await?.into())
    }
}

#[async_trait]
impl QueryHandler<GetAccountQuery> for AccountQueryHandler {
    type Error = AuthError;

    async fn handle(&self, query: GetAccountQuery) -> Result<AccountDto, AuthError> {
        Ok(self.auth.account(&query.user_id).await?.into())
    }
}

pub struct WalletQueryHandler {
    wallet: Arc<WalletService>,
}

impl WalletQueryHandler {
    pub fn new(wallet: Arc<WalletService>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl QueryHandler<GetWalletQuery> for WalletQueryHandler {
    type Error = AuthError;

    async fn handle(&self, query: GetWalletQuery) -> Result<WalletSummary, AuthError> {
        Ok(self.wallet.summary(&query.user_id).await?)
    }
}
