use std::sync::Arc;

use lms_core::model::{User, UserId};
use tracing::warn;

use crate::records::UserRecord;
use crate::repository::{KeyValueStore, StorageError};

/// Registered users on top of a key-value backend.
///
/// Users live under `user:{id}`; `user-email:{email}` maps a normalized email
/// to its user id.
#[derive(Clone)]
pub struct UserStore {
    kv: Arc<dyn KeyValueStore>,
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// `ada@example.com` becomes `a***@example.com`; logs never carry a full address.
fn redact_email(email: &str) -> String {
    let (local, domain) = email.split_once('@').unwrap_or((email, ""));
    let first = local.chars().next().map(String::from).unwrap_or_default();
    format!("{first}***@{domain}")
}

impl UserStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn user_key(id: &UserId) -> String {
        format!("user:{id}")
    }

    fn email_key(email: &str) -> String {
        format!("user-email:{email}")
    }

    /// Fetch a user by id. Unreadable records read as absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend fails.
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        let key = Self::user_key(id);
        let Some(raw) = self.kv.read(&key).await? else {
            return Ok(None);
        };
        let user = serde_json::from_str::<UserRecord>(&raw)
            .map_err(ser)
            .and_then(|record| record.into_user().map_err(ser));
        match user {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(%key, error = %err, "discarding unreadable user record");
                Ok(None)
            }
        }
    }

    /// Look up a user by an already-normalized email.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let Some(raw_id) = self.kv.read(&Self::email_key(email)).await? else {
            return Ok(None);
        };
        let Ok(id) = raw_id.parse::<UserId>() else {
            warn!(email = %redact_email(email), "discarding malformed email index entry");
            return Ok(None);
        };
        Ok(self.get(&id).await?.filter(|user| user.email() == email))
    }

    /// Store a new user and claim its email.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email already belongs to a user.
    pub async fn insert(&self, user: &User) -> Result<(), StorageError> {
        if self.find_by_email(user.email()).await?.is_some() {
            return Err(StorageError::Conflict);
        }
        self.write_user(user).await?;
        self.kv
            .write(&Self::email_key(user.email()), user.id().to_string())
            .await
    }

    /// Overwrite an existing user, e.g. after a login.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user was never inserted.
    pub async fn update(&self, user: &User) -> Result<(), StorageError> {
        if self.get(user.id()).await?.is_none() {
            return Err(StorageError::NotFound);
        }
        self.write_user(user).await
    }

    async fn write_user(&self, user: &User) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&UserRecord::from_user(user)).map_err(ser)?;
        self.kv.write(&Self::user_key(user.id()), raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use chrono::Duration;
    use lms_core::time::fixed_now;

    fn user(email: &str) -> User {
        User::register(UserId::generate(), "Ada", email, "hash".into(), fixed_now()).unwrap()
    }

    #[tokio::test]
    async fn insert_then_find_by_email() {
        let store = UserStore::new(Arc::new(InMemoryStore::new()));
        let ada = user("ada@example.com");
        store.insert(&ada).await.unwrap();

        let found = store.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(found, Some(ada.clone()));
        assert_eq!(store.get(ada.id()).await.unwrap(), Some(ada));
        assert!(store.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = UserStore::new(Arc::new(InMemoryStore::new()));
        store.insert(&user("ada@example.com")).await.unwrap();
        let err = store.insert(&user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn update_requires_existing_user() {
        let store = UserStore::new(Arc::new(InMemoryStore::new()));
        let mut ada = user("ada@example.com");
        assert!(matches!(
            store.update(&ada).await.unwrap_err(),
            StorageError::NotFound
        ));

        store.insert(&ada).await.unwrap();
        ada.record_login(fixed_now() + Duration::days(1));
        store.update(&ada).await.unwrap();
        let reread = store.get(ada.id()).await.unwrap().unwrap();
        assert_eq!(reread.last_login(), fixed_now() + Duration::days(1));
    }

    #[tokio::test]
    async fn corrupt_user_reads_as_absent() {
        let kv = InMemoryStore::new();
        let store = UserStore::new(Arc::new(kv.clone()));
        let id = UserId::generate();
        kv.write(&format!("user:{id}"), "[]".into()).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[test]
    fn redacted_email_hides_the_local_part() {
        assert_eq!(redact_email("ada@example.com"), "a***@example.com");
        assert_eq!(redact_email("broken"), "b***@");
        assert!(!redact_email("grace.hopper@navy.mil").contains("grace"));
    }
}
