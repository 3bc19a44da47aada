//! Account DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::account::{Account, AccountRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub role: AccountRole,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountDto {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email.as_str().to_string(),
            phone: account.phone.as_ref().map(|p| p.as_str().to_string()),
            name: account.name.clone(),
            role: account.role,
            email_verified: account.email_verified,
            phone_verified: account.phone_verified,
            has_password: account.has_password(),
            created_at: account.created_at,
        }
    }
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self::from(&account)
    }
}
