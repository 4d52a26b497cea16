use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{PasswordError, PasswordHasher, PasswordPolicy, TokenError, TokenService};
use crate::database::{StoreError, User, UserPublic, UserStore};

pub const TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email already registered")]
    EmailConflict,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub user_name: String,
    pub user_email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// Registration and login flows over the credential store
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>, policy: PasswordPolicy) -> Self {
        Self {
            users,
            tokens,
            hasher: PasswordHasher::new(),
            policy,
        }
    }

    /// Create a user account. The plaintext password is dropped as soon as
    /// it has been hashed.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserPublic, AccountError> {
        let RegisterRequest { user_name, user_email, password } = request;

        let user_name = user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(AccountError::Validation {
                field: "user_name",
                message: "Name cannot be empty".to_string(),
            });
        }
        validate_email_format(&user_email)
            .map_err(|message| AccountError::Validation { field: "user_email", message })?;
        self.policy
            .check(&password)
            .map_err(|message| AccountError::Validation { field: "password", message })?;

        if self.users.find_user_by_email(&user_email).await?.is_some() {
            tracing::info!("Registration rejected: email already registered");
            return Err(AccountError::EmailConflict);
        }

        let hashed_password = self.hash_password(password).await?;

        let user = User {
            user_id: Uuid::new_v4().to_string(),
            user_name,
            user_email,
            hashed_password,
        };

        // The unique index is authoritative: a racing registration that passed
        // the pre-check still ends up here
        match self.users.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(constraint)) => {
                tracing::info!("Registration rejected by constraint {}", constraint);
                return Err(AccountError::EmailConflict);
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Registered user {}", user.user_id);
        Ok(UserPublic::from(user))
    }

    /// Verify credentials and issue an access token whose subject is the email
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, AccountError> {
        let user = match self.users.find_user_by_email(email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Login failed: unknown email");
                return Err(AccountError::InvalidCredentials);
            }
        };

        if !self.verify_password(password.to_string(), user.hashed_password.clone()).await? {
            tracing::warn!("Login failed: bad password for user {}", user.user_id);
            return Err(AccountError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(&user.user_email)?;
        tracing::info!("User {} logged in", user.user_id);

        Ok(AccessToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, AccountError> {
        let hasher = self.hasher.clone();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))??;
        Ok(hashed)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AccountError> {
        let hasher = self.hasher.clone();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| PasswordError::Verify(e.to_string()))??;
        Ok(matched)
    }
}

/// Basic email validation for registration
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format".to_string());
    }

    let domain = parts[1];
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::database::MemoryStore;

    fn service_with(policy: PasswordPolicy) -> (AccountService, Arc<TokenService>, Arc<MemoryStore>) {
        let tokens = Arc::new(
            TokenService::new(&SecurityConfig {
                jwt_secret: "account-test-secret".to_string(),
                jwt_algorithm: jsonwebtoken::Algorithm::HS256,
                token_ttl_minutes: 30,
                cors_origins: vec![],
            })
            .unwrap(),
        );
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(store.clone(), tokens.clone(), policy);
        (service, tokens, store)
    }

    fn service() -> (AccountService, Arc<TokenService>, Arc<MemoryStore>) {
        service_with(PasswordPolicy::default())
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            user_name: "alice".to_string(),
            user_email: "a@x.com".to_string(),
            password: "pw1".to_string(),
        }
    }

    #[tokio::test]
    async fn register_returns_public_view() {
        let (service, _, store) = service();
        let public = service.register(alice()).await.unwrap();

        assert!(!public.user_id.is_empty());
        assert_eq!(public.user_name, "alice");
        assert_eq!(public.user_email, "a@x.com");

        let stored = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(stored.hashed_password, "pw1");
        assert_eq!(stored.user_id, public.user_id);
    }

    #[tokio::test]
    async fn second_registration_with_same_email_conflicts() {
        let (service, _, _) = service();
        service.register(alice()).await.unwrap();

        let mut again = alice();
        again.user_name = "other".to_string();
        assert!(matches!(service.register(again).await, Err(AccountError::EmailConflict)));
    }

    #[tokio::test]
    async fn concurrent_registrations_admit_exactly_one() {
        let (service, _, _) = service();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.register(alice()).await }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AccountError::EmailConflict) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn login_issues_token_for_registered_email() {
        let (service, tokens, _) = service();
        service.register(alice()).await.unwrap();

        let token = service.login("a@x.com", "pw1").await.unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(tokens.verify(&token.access_token).unwrap(), "a@x.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let (service, _, _) = service();
        service.register(alice()).await.unwrap();

        let wrong = service.login("a@x.com", "wrong").await.unwrap_err();
        let unknown = service.login("nobody@x.com", "pw1").await.unwrap_err();

        assert!(matches!(wrong, AccountError::InvalidCredentials));
        assert!(matches!(unknown, AccountError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn registration_enforces_password_policy() {
        let (service, _, _) = service_with(PasswordPolicy {
            min_length: 8,
            max_length: None,
            require_digit: false,
        });

        let err = service.register(alice()).await.unwrap_err();
        assert!(matches!(err, AccountError::Validation { field: "password", .. }));
    }

    #[tokio::test]
    async fn registration_rejects_bad_input() {
        let (service, _, _) = service();

        let mut bad_email = alice();
        bad_email.user_email = "not-an-email".to_string();
        assert!(matches!(
            service.register(bad_email).await,
            Err(AccountError::Validation { field: "user_email", .. })
        ));

        let mut blank_name = alice();
        blank_name.user_name = "   ".to_string();
        assert!(matches!(
            service.register(blank_name).await,
            Err(AccountError::Validation { field: "user_name", .. })
        ));

        let mut empty_password = alice();
        empty_password.password = String::new();
        assert!(matches!(
            service.register(empty_password).await,
            Err(AccountError::Validation { field: "password", .. })
        ));
    }

    #[test]
    fn email_format_checks() {
        assert!(validate_email_format("a@x.com").is_ok());
        assert!(validate_email_format("").is_err());
        assert!(validate_email_format("a@x").is_err());
        assert!(validate_email_format("@x.com").is_err());
        assert!(validate_email_format("a@@x.com").is_err());
        assert!(validate_email_format("a b@x.com").is_err());
    }
}
