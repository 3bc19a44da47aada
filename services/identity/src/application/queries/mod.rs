//! Queries

use bhada_common::UserId;
use bhada_cqrs_core::Query;
use serde::Deserialize;

use crate::application::dto::{AccountDto, EmailCheckResult};
use crate::domain::services::WalletSummary;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckEmailQuery {
    pub email: String,
}

impl Query for CheckEmailQuery {
    type Result = EmailCheckResult;
}

#[derive(Debug, Clone)]
pub struct GetAccountQuery {
    pub user_id: UserId,
}

impl Query for GetAccountQuery {
    type Result = AccountDto;
}

#[derive(Debug, Clone)]
pub struct GetWalletQuery {
    pub user_id: UserId,
}

impl Query for GetWalletQuery {
    type Result = WalletSummary;
}
