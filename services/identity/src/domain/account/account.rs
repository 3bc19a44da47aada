//! Account entity

use bhada_common::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::value_objects::{Email, HashedPassword, Phone};

/// Property owners list rooms; vendors advertise services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    #[default]
    Owner,
    Vendor,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Vendor => "vendor",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "vendor" => Ok(Self::Vendor),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: UserId,
    pub email: Email,
    pub phone: Option<Phone>,
    pub name: Option<String>,
    pub role: AccountRole,
    pub password_hash: Option<HashedPassword>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Account created by proving control of the email address
    pub fn new(email: Email, role: AccountRole) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email,
            phone: None,
            name: None,
            role,
            password_hash: None,
            email_verified: true,
            phone_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }

    pub fn with_password(mut self, password_hash: HashedPassword) -> Self {
        self.password_hash = Some(password_hash);
        self
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn set_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = Some(password_hash);
        self.updated_at = Utc::now();
    }

    /// Resetting a password through an emailed code also proves the address
    pub fn reset_password(&mut self, password_hash: HashedPassword) {
        self.email_verified = true;
        self.set_password(password_hash);
    }

    pub fn verify_phone(&mut self, phone: Phone) {
        self.phone = Some(phone);
        self.phone_verified = true;
        self.updated_at = Utc::now();
    }
}
