use sea_orm::{DatabaseConnection, SqlErr};

use crate::auth::domain::{AuthUser, StoredUser};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user(&self, username: &str) -> Result<Option<StoredUser>, AuthError> {
        let res = models::user::find(&self.db, username).await?;
        Ok(res.map(|u| StoredUser {
            user: AuthUser { username: u.username, created_at: u.created_at },
            password_hash: u.hashed_password,
        }))
    }

    async fn create_user(&self, username: &str, password_hash: &str, created_at: i64) -> Result<AuthUser, AuthError> {
        use sea_orm::{ActiveModelTrait, Set};

        let username = models::user::normalize_username(username);
        models::user::validate_username(&username)?;
        let am = models::user::ActiveModel {
            username: Set(username),
            hashed_password: Set(password_hash.to_string()),
            created_at: Set(created_at),
        };
        let created = am.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AuthError::Conflict,
            _ => AuthError::Repository(e.to_string()),
        })?;
        Ok(AuthUser { username: created.username, created_at: created.created_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn create_find_and_conflict() -> Result<(), anyhow::Error> {
        let repo = SeaOrmAuthRepository { db: get_db().await? };
        let created = repo.create_user("Alice", "hash", 42).await?;
        assert_eq!(created.username, "alice");

        let found = repo.find_user("alice").await?.expect("stored");
        assert_eq!(found.password_hash, "hash");
        assert_eq!(found.user.created_at, 42);

        let err = repo.create_user("alice", "hash2", 43).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
        assert!(repo.find_user("bob").await?.is_none());
        Ok(())
    }
}
