use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::UserId;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("last login precedes registration")]
    InvalidLoginTime,
}

/// Lower-cases and trims an email, then checks it has the `local@domain` shape.
///
/// # Errors
///
/// Returns `UserError::InvalidEmail` when the address is malformed.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(UserError::InvalidEmail),
    }
}

/// # Errors
///
/// Returns `UserError::PasswordTooShort` below [`MIN_PASSWORD_LEN`] characters.
pub fn check_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::PasswordTooShort);
    }
    Ok(())
}

/// A registered learner. The password is only ever held as a hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    password_hash: String,
    registered_at: DateTime<Utc>,
    last_login: DateTime<Utc>,
}

impl User {
    /// Creates a freshly registered user. `last_login` starts at `registered_at`.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the name is blank or the email is malformed.
    pub fn register(
        id: UserId,
        name: impl Into<String>,
        email: &str,
        password_hash: String,
        registered_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        Self::from_persisted(id, name, email, password_hash, registered_at, registered_at)
    }

    /// Rehydrate a user from storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError` for blank names, malformed emails, or a last login
    /// earlier than registration.
    pub fn from_persisted(
        id: UserId,
        name: impl Into<String>,
        email: &str,
        password_hash: String,
        registered_at: DateTime<Utc>,
        last_login: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        if last_login < registered_at {
            return Err(UserError::InvalidLoginTime);
        }
        Ok(Self {
            id,
            name,
            email: normalize_email(email)?,
            password_hash,
            registered_at,
            last_login,
        })
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        if at > self.last_login {
            self.last_login = at;
        }
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    #[must_use]
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    #[must_use]
    pub fn last_login(&self) -> DateTime<Utc> {
        self.last_login
    }
}
