use async_trait::async_trait;

use super::domain::{AuthUser, StoredUser};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<StoredUser>, AuthError>;
    /// Fails with `Conflict` if the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str, created_at: i64) -> Result<AuthUser, AuthError>;
}

/// Simple in-memory mock repository for tests
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, StoredUser>>, // key: username
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user(&self, username: &str) -> Result<Option<StoredUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(username).cloned())
        }

        async fn create_user(&self, username: &str, password_hash: &str, created_at: i64) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(username) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { username: username.to_string(), created_at };
            users.insert(
                username.to_string(),
                StoredUser { user: user.clone(), password_hash: password_hash.to_string() },
            );
            Ok(user)
        }
    }
}
