use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use common::clock::Clock;
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use super::domain::{AuthSession, AuthUser, Credentials};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::TokenIssuer;

pub const PASSWORD_MIN_LEN: usize = 6;

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, tokens: TokenIssuer, clock: Arc<dyn Clock>) -> Self {
        Self { repo, tokens, clock }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a new user and open a session for them.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: Credentials) -> Result<AuthSession, AuthError> {
        let username = models::user::normalize_username(&input.username);
        models::user::validate_username(&username)?;
        if input.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AuthError::Validation(format!("password too short (>={PASSWORD_MIN_LEN})")));
        }
        if self.repo.find_user(&username).await?.is_some() {
            debug!("user exists: {}", username);
            return Err(AuthError::Conflict);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self.repo.create_user(&username, &hash, self.clock.now().timestamp()).await?;
        info!(username = %user.username, "user_registered");
        self.open_session(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// `NotFound` for an unknown username, `Unauthorized` for a wrong password.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: Credentials) -> Result<AuthSession, AuthError> {
        let stored = self.repo
            .find_user(&models::user::normalize_username(&input.username))
            .await?
            .ok_or(AuthError::NotFound)?;

        let parsed = PasswordHash::new(&stored.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }
        info!(username = %stored.user.username, "user_logged_in");
        self.open_session(stored.user)
    }

    /// Username behind a session token.
    pub fn resolve_caller(&self, token: &str) -> Result<String, AuthError> {
        self.tokens.verify(token)
    }

    fn open_session(&self, user: AuthUser) -> Result<AuthSession, AuthError> {
        let token = self.tokens.sign(&user.username)?;
        Ok(AuthSession { user, token })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::clock::ManualClock;

    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;
    use crate::test_support::noon;

    fn svc() -> AuthService<MockAuthRepository> {
        AuthService::new(
            Arc::new(MockAuthRepository::default()),
            TokenIssuer::new("secret", Duration::from_secs(3600)),
            Arc::new(ManualClock::new(noon(2024, 6, 1))),
        )
    }

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials { username: username.into(), password: password.into() }
    }

    #[tokio::test]
    async fn register_then_login() {
        let svc = svc();
        let session = svc.register(creds("  Alice ", "hunter22")).await.unwrap();
        assert_eq!(session.user.username, "alice");
        assert_eq!(session.user.created_at, noon(2024, 6, 1).timestamp());
        assert_eq!(svc.resolve_caller(&session.token).unwrap(), "alice");

        let session = svc.login(creds("ALICE", "hunter22")).await.unwrap();
        assert_eq!(session.user.username, "alice");
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let svc = svc();
        svc.register(creds("alice", "hunter22")).await.unwrap();
        let err = svc.register(creds("Alice", "other-pass")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn rejects_short_inputs() {
        let svc = svc();
        assert!(matches!(svc.register(creds("al", "hunter22")).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.register(creds("alice", "12345")).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn login_failures() {
        let svc = svc();
        svc.register(creds("alice", "hunter22")).await.unwrap();
        assert!(matches!(svc.login(creds("alice", "wrong-pass")).await, Err(AuthError::Unauthorized)));
        assert!(matches!(svc.login(creds("nobody", "hunter22")).await, Err(AuthError::NotFound)));
    }
}
