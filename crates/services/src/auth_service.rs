use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use lms_core::model::{User, UserId, check_password, normalize_email};
use storage::repository::StorageError;
use storage::user_store::UserStore;
use tracing::info;

use crate::error::AuthError;
use crate::Clock;

/// Registration and login against the user store.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    users: UserStore,
}

impl AuthService {
    #[must_use]
    pub fn new(clock: Clock, users: UserStore) -> Self {
        Self { clock, users }
    }

    /// Validate, hash the password, and store a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUser` for validation failures and
    /// `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        check_password(password)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password)?;
        let user = User::register(
            UserId::generate(),
            name,
            &email,
            password_hash,
            self.clock.now(),
        )?;
        self.users.insert(&user).await.map_err(|err| match err {
            StorageError::Conflict => AuthError::EmailTaken,
            other => AuthError::Storage(other),
        })?;

        info!(user_id = %user.id(), "registered user");
        Ok(user)
    }

    /// Check credentials and stamp `last_login`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a wrong
    /// password; the two cases are not distinguished.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Ok(email) = normalize_email(email) else {
            return Err(AuthError::InvalidCredentials);
        };
        let Some(mut user) = self.users.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, user.password_hash()) {
            return Err(AuthError::InvalidCredentials);
        }

        user.record_login(self.clock.now());
        self.users.update(&user).await?;
        info!(user_id = %user.id(), "user logged in");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store fails.
    pub async fn user(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(id).await?)
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
