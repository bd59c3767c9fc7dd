//! Local checks run before auth requests leave the client.

use crate::client::error::ClientError;
use crate::core::account::validation_message;
use validator::Validate;

#[derive(Debug, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginForm {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_owned(),
            password: password.to_owned(),
        }
    }

    pub fn check(&self) -> Result<(), ClientError> {
        self.validate()
            .map_err(|e| ClientError::Validation(validation_message(&e)))
    }
}

#[derive(Debug, Validate)]
pub struct SignupForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn new(name: &str, email: &str, password: &str, confirm_password: &str) -> Self {
        Self {
            name: name.trim().to_owned(),
            email: email.trim().to_owned(),
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        }
    }

    pub fn check(&self) -> Result<(), ClientError> {
        self.validate()
            .map_err(|e| ClientError::Validation(validation_message(&e)))?;

        if self.password != self.confirm_password {
            return Err(ClientError::Validation("Passwords do not match".to_owned()));
        }
        Ok(())
    }
}
