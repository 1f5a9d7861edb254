//! # Auth Gateway
//!
//! Sign-in and account creation over the identity store, plus bearer
//! session issuance. A resolved session becomes an explicit `AuthContext`
//! parameter for the operations that need one; nothing ambient.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use shop_core::{AuthContext, BoxedUserStore, Credentials, ShopError, ShopResult, User};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

/// In-process bearer token registry.
///
/// Tokens are opaque uuids; each maps to the identity resolved at sign-in.
#[derive(Clone, Default)]
pub struct SessionStore {
    tokens: Arc<RwLock<HashMap<String, AuthContext>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for an authenticated identity
    pub fn issue(&self, context: AuthContext) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .write()
            .expect("session store lock poisoned")
            .insert(token.clone(), context);
        token
    }

    /// Resolve a bearer token to its identity, if the session exists
    pub fn resolve(&self, token: &str) -> Option<AuthContext> {
        self.tokens
            .read()
            .expect("session store lock poisoned")
            .get(token)
            .cloned()
    }

    /// Drop a session. Unknown tokens are a no-op.
    pub fn revoke(&self, token: &str) {
        self.tokens
            .write()
            .expect("session store lock poisoned")
            .remove(token);
    }
}

/// Sign-in and account-creation operations.
#[derive(Clone)]
pub struct AuthGateway {
    users: BoxedUserStore,
    sessions: SessionStore,
}

impl AuthGateway {
    pub fn new(users: BoxedUserStore, sessions: SessionStore) -> Self {
        Self { users, sessions }
    }

    /// Create a new identity record.
    ///
    /// Fails with `Validation` on malformed input (checked before any
    /// store call) and `Conflict` when the email is already registered.
    #[instrument(skip(self, credentials))]
    pub async fn create_account(&self, credentials: &Credentials) -> ShopResult<User> {
        let email = credentials.validate()?;
        let password_hash = hash_password(&credentials.password)?;

        let user = self.users.create(&email, &password_hash).await?;

        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown email and wrong password both fail with `Unauthorized`;
    /// nothing distinguishes them to the caller.
    #[instrument(skip(self, credentials))]
    pub async fn sign_in(&self, credentials: &Credentials) -> ShopResult<String> {
        let email = credentials.validate()?;

        let (user, password_hash) = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ShopError::Unauthorized)?;

        verify_password(&credentials.password, &password_hash)?;

        let token = self.sessions.issue(AuthContext::new(user.id.clone(), user.email));

        info!(user_id = %user.id, "signed in");
        Ok(token)
    }
}

/// Hash a password with Argon2id
fn hash_password(password: &str) -> ShopResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ShopError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against its stored hash
fn verify_password(password: &str, password_hash: &str) -> ShopResult<()> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| ShopError::Internal(format!("stored password hash invalid: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ShopError::Unauthorized)
}
