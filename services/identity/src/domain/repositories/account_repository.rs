use async_trait::async_trait;
use bhada_common::UserId;
use bhada_errors::AppResult;

use crate::domain::account::Account;
use crate::domain::value_objects::Email;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account; `AppError::Conflict` when the email is taken
    async fn create(&self, account: &Account) -> AppResult<()>;

    async fn update(&self, account: &Account) -> AppResult<()>;

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<Account>>;

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Account>>;
}
