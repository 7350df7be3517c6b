//! # AuthService
//!
//! Registration, login and session lookup. Sessions are stateless: the
//! [`SessionCodec`] signs them into a token and nothing is stored server-side,
//! so a token stays valid until it expires or the client drops the cookie.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::{
    AccountRepository, DomainError, DomainResult, NewRegistration, NewUser, PasswordHasher,
    RegisteredUser, Session, SessionCodec, UserRepository,
};

use crate::validation;

/// The one message for every credential failure, so callers cannot tell
/// an unknown email from a wrong password.
pub const INVALID_CREDENTIALS: &str = "invalid email or password";

/// A fresh session and the signed token that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub session: Session,
    pub token: String,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: Arc<dyn SessionCodec>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        accounts: Arc<dyn AccountRepository>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: Arc<dyn SessionCodec>,
    ) -> Self {
        Self { users, accounts, hasher, sessions }
    }

    /// Creates a user and its account. Email is checked for duplicates
    /// before the username. The two rows are written together, so a lost
    /// race surfaces as the repository's `Conflict` with nothing stored.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> DomainResult<RegisteredUser> {
        let username = validation::username(username)?;
        let email = validation::email(email)?;
        let password = validation::password(password)?;

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("email is already in use".into()));
        }
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(DomainError::Conflict("username is already in use".into()));
        }

        let password_hash = self.hasher.hash(password).await?;

        let (user, account) = self
            .accounts
            .create_with_user(NewRegistration {
                user: NewUser { username: username.clone(), nickname: Some(username) },
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");

        Ok(RegisteredUser { id: user.id, username: user.username, email: account.email })
    }

    /// Verifies credentials, records the login and issues a session token.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<LoginOutcome> {
        let email = validation::required("email", email)?;
        if password.trim().is_empty() {
            return Err(DomainError::validation("password is required"));
        }

        let rejected = || DomainError::Unauthenticated(INVALID_CREDENTIALS.into());

        let Some(account) = self.accounts.find_by_email(&email).await? else {
            tracing::warn!("login rejected: unknown email");
            return Err(rejected());
        };
        let Some(hash) = account.password_hash.as_deref() else {
            tracing::warn!(account_id = %account.id, "login rejected: account has no password");
            return Err(rejected());
        };
        if !self.hasher.verify(password, hash).await? {
            tracing::warn!(account_id = %account.id, "login rejected: password mismatch");
            return Err(rejected());
        }

        let Some(user) = self.users.find_by_id(account.user_id).await? else {
            tracing::error!(account_id = %account.id, user_id = %account.user_id, "account without user");
            return Err(rejected());
        };

        let account = self.accounts.record_login(account.id, Utc::now()).await?;

        let session = Session {
            user_id: user.id,
            username: user.username,
            email: account.email,
        };
        let token = self.sessions.issue(&session)?;

        tracing::info!(
            user_id = %session.user_id,
            login_count = account.login_count,
            "user logged in"
        );

        Ok(LoginOutcome { session, token })
    }

    /// Resolves a cookie value to a session. Never fails: anything that does
    /// not decode cleanly is treated as no session.
    pub fn session_from_token(&self, token: Option<&str>) -> Option<Session> {
        let token = token.filter(|t| !t.is_empty())?;
        self.sessions.decode(token)
    }

    pub fn session_ttl(&self) -> Duration {
        self.sessions.ttl()
    }
}
