//! User accounts and the bearer sessions issued to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Public view of a user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A freshly issued bearer token and its owner.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Validate)]
pub struct NewAccount {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl NewAccount {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.trim().to_owned(),
            email: normalize_email(email),
            password: password.to_owned(),
        }
    }
}

#[derive(Debug, Validate)]
pub struct LoginAttempt {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginAttempt {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: normalize_email(email),
            password: password.to_owned(),
        }
    }
}

/// Lower-cased, trimmed email used for lookups and uniqueness.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Flattens validator errors into one line, sorted for stable output.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();

    messages.sort();
    messages.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_normalizes_fields() {
        let account = NewAccount::new("  Ada  ", " Ada@Example.COM ", "secret1");

        assert_eq!(account.name, "Ada");
        assert_eq!(account.email, "ada@example.com");
        assert!(account.validate().is_ok());
    }

    #[test]
    fn test_new_account_reports_every_invalid_field() {
        let errors = NewAccount::new(" ", "not-an-email", "123")
            .validate()
            .unwrap_err();

        let message = validation_message(&errors);
        assert!(message.contains("Name is required"));
        assert!(message.contains("Email is invalid"));
        assert!(message.contains("Password must be at least 6 characters"));
    }

    #[test]
    fn test_login_attempt_requires_password() {
        let errors = LoginAttempt::new("ada@example.com", "").validate().unwrap_err();

        assert_eq!(validation_message(&errors), "Password is required");
    }
}
