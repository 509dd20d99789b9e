// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and credential checks.
//!
//! Passwords are stored as `pbkdf2-sha256$<iterations>$<salt>$<hash>` with
//! base64 salt and hash, derived with `ring`.

use crate::db::TripStore;
use crate::error::{AppError, Result};
use crate::models::{normalize_email, User, UserSummary};
use crate::time_utils::format_utc_rfc3339;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use validator::Validate;

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const HASH_SCHEME: &str = "pbkdf2-sha256";

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 200))]
    pub password: String,
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("failed to generate salt")))?;

    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("iteration count is zero")))?;

    let mut hash = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(PBKDF2_ALG, iterations, &salt, password.as_bytes(), &mut hash);

    Ok(format!(
        "{}${}${}${}",
        HASH_SCHEME,
        PBKDF2_ITERATIONS,
        BASE64.encode(salt),
        BASE64.encode(hash)
    ))
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return false;
    };
    if *scheme != HASH_SCHEME {
        return false;
    }

    let Some(iterations) = iterations.parse().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (BASE64.decode(salt), BASE64.decode(hash)) else {
        return false;
    };

    pbkdf2::verify(PBKDF2_ALG, iterations, &salt, password.as_bytes(), &hash).is_ok()
}

/// Run a PBKDF2 computation on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password task failed: {}", e)))
}

/// User registration and login.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn TripStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn TripStore>) -> Self {
        Self { store }
    }

    /// Register a new account.
    pub async fn register(&self, form: Registration) -> Result<UserSummary> {
        form.validate()?;

        let email = normalize_email(&form.email);
        async {
            if self.store.find_user_by_email(&email).await?.is_some() {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }

            let password = form.password.clone();
            let password_hash = run_blocking(move || hash_password(&password)).await??;

            let user = User {
                id: uuid::Uuid::new_v4().to_string(),
                name: form.name.trim().to_string(),
                email: email.clone(),
                password_hash,
                created_at: format_utc_rfc3339(chrono::Utc::now()),
            };
            self.store.insert_user(&user).await?;

            tracing::info!(user_id = %user.id, "User registered");
            Ok::<_, AppError>(UserSummary::from(&user))
        }
        .await
        .map_err(AppError::during("Failed to register user"))
    }

    /// Check credentials and return the matching account.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<User> {
        let email = normalize_email(&credentials.email);
        let user = self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(AppError::during("Failed to sign in"))?;

        if let Some(user) = user {
            let password = credentials.password.clone();
            let stored = user.password_hash.clone();
            if run_blocking(move || verify_password(&password, &stored)).await? {
                return Ok(user);
            }
        }

        tracing::debug!("Rejected sign-in attempt");
        Err(AppError::InvalidCredentials)
    }

    /// Look up the account behind a session.
    pub async fn get(&self, user_id: &str) -> Result<UserSummary> {
        self.store
            .get_user(user_id)
            .await
            .map_err(AppError::during("Failed to fetch user"))?
            .map(|u| UserSummary::from(&u))
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> (UserService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (UserService::new(store.clone()), store)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[test]
    fn test_password_hash_verifies() {
        let stored = hash_password("password123").unwrap();
        assert!(stored.starts_with("pbkdf2-sha256$"));
        assert!(verify_password("password123", &stored));
        assert!(!verify_password("password124", &stored));
        assert!(!verify_password("password123", "garbage"));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(
            hash_password("password123").unwrap(),
            hash_password("password123").unwrap()
        );
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let (users, _) = service();
        let summary = users.register(registration("User@Example.com")).await.unwrap();
        assert_eq!(summary.email, "user@example.com");

        let user = users
            .authenticate(&Credentials {
                email: "user@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.id, summary.id);

        let err = users
            .authenticate(&Credentials {
                email: "user@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (users, _) = service();
        users.register(registration("a@example.com")).await.unwrap();
        let err = users
            .register(registration("A@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Email already in use"));
    }

    #[tokio::test]
    async fn test_invalid_form_rejected() {
        let (users, _) = service();
        let mut form = registration("not-an-email");
        assert!(matches!(
            users.register(form.clone()).await,
            Err(AppError::BadRequest(_))
        ));
        form.email = "ok@example.com".to_string();
        form.password = "short".to_string();
        assert!(matches!(users.register(form).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_leaves_runtime_responsive() {
        let (users, _) = service();
        let pending = tokio::spawn(async move {
            users.register(registration("a@example.com")).await
        });

        // On a single-threaded runtime this timer only fires before the
        // registration finishes if hashing runs off the runtime thread.
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        assert!(!pending.is_finished());

        pending.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_storage_fault_is_generic() {
        let (users, store) = service();
        store.set_offline(true);
        let err = users.register(registration("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::OperationFailed("Failed to register user")));
    }
}
