use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::validation::{Rule, Validate};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Never serialized into responses.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new user from a validated create request.
    pub fn new(dto: UserCreateDto) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: dto.email,
            password: dto.password,
            username: dto.username,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload for creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreateDto {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
}

impl Validate for UserCreateDto {
    const RULES: &'static [(&'static str, &'static [Rule])] = &[
        ("email", &[Rule::Required, Rule::Email]),
        ("password", &[Rule::Required, Rule::MinLen(8)]),
        ("username", &[Rule::Required, Rule::MinLen(3), Rule::MaxLen(30)]),
    ];

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "email" => Some(Cow::Borrowed(&self.email)),
            "password" => Some(Cow::Borrowed(&self.password)),
            "username" => Some(Cow::Borrowed(&self.username)),
            _ => None,
        }
    }
}

/// User as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseDto {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponseDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
