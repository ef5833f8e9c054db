use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{
    password::PasswordHelper,
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User, DEFAULT_ROLE_ID},
};

const MIN_PASSWORD_CHARS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("invalid password: {reason}")]
    InvalidPassword { reason: String },
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("bad credentials")]
    BadCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Input to registration. Any role the caller asked for is not part of it.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub username: String,
}

/// Runs after a user has been persisted. Failures never fail registration.
#[async_trait]
pub trait RegisterHook: Send + Sync {
    async fn on_after_register(&self, user: &User) -> anyhow::Result<()>;
}

pub struct LogRegistration;

#[async_trait]
impl RegisterHook for LogRegistration {
    async fn on_after_register(&self, user: &User) -> anyhow::Result<()> {
        info!(user_id = user.id, "user has registered");
        Ok(())
    }
}

pub struct UserManager {
    store: Arc<dyn UserStore>,
    password: PasswordHelper,
    hook: Arc<dyn RegisterHook>,
}

impl UserManager {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            password: PasswordHelper::default(),
            hook: Arc::new(LogRegistration),
        }
    }

    #[cfg(test)]
    pub fn with_password_helper(mut self, password: PasswordHelper) -> Self {
        self.password = password;
        self
    }

    #[cfg(test)]
    pub fn with_hook(mut self, hook: Arc<dyn RegisterHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Argon2 is CPU bound; run it on the blocking pool.
    async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let helper = self.password.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || helper.hash(&password))
            .await
            .context("password hash task")?
    }

    async fn verify_password(
        &self,
        password: &str,
        hash: &str,
    ) -> anyhow::Result<(bool, Option<String>)> {
        let helper = self.password.clone();
        let (password, hash) = (password.to_owned(), hash.to_owned());
        tokio::task::spawn_blocking(move || helper.verify_and_update(&password, &hash))
            .await
            .context("password verify task")
    }

    pub async fn get(&self, id: i32) -> anyhow::Result<Option<User>> {
        self.store.get(id).await
    }

    pub fn validate_password(&self, password: &str) -> Result<(), ManagerError> {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ManagerError::InvalidPassword {
                reason: format!("Password should be at least {MIN_PASSWORD_CHARS} characters"),
            });
        }
        Ok(())
    }

    #[instrument(skip(self, user_create), fields(email = %user_create.email))]
    pub async fn create(&self, user_create: UserCreate) -> Result<User, ManagerError> {
        self.validate_password(&user_create.password)?;

        if self.store.get_by_email(&user_create.email).await?.is_some() {
            warn!("email already registered");
            return Err(ManagerError::UserAlreadyExists);
        }

        let hashed_password = self.hash_password(&user_create.password).await?;

        let user = self
            .store
            .create(NewUser {
                email: user_create.email,
                username: user_create.username,
                hashed_password,
                role_id: DEFAULT_ROLE_ID,
            })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent registration
                StoreError::DuplicateEmail => ManagerError::UserAlreadyExists,
                StoreError::Other(e) => ManagerError::Internal(e),
            })?;

        if let Err(e) = self.hook.on_after_register(&user).await {
            warn!(error = %e, user_id = user.id, "post-register hook failed");
        }

        Ok(user)
    }

    /// Unknown email, wrong password and inactive account are indistinguishable.
    #[instrument(skip(self, email, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ManagerError> {
        let Some(user) = self.store.get_by_email(email).await? else {
            // keep response time close to the wrong-password path
            let _ = self.hash_password(password).await;
            warn!("login for unknown email");
            return Err(ManagerError::BadCredentials);
        };

        let (verified, updated_hash) = self
            .verify_password(password, &user.hashed_password)
            .await?;
        if !verified {
            warn!(user_id = user.id, "login with wrong password");
            return Err(ManagerError::BadCredentials);
        }

        if !user.is_active {
            warn!(user_id = user.id, "login for inactive user");
            return Err(ManagerError::BadCredentials);
        }

        if let Some(hash) = updated_hash {
            if let Err(e) = self.store.update_password_hash(user.id, &hash).await {
                warn!(error = %e, user_id = user.id, "password rehash not stored");
            }
        }

        Ok(user)
    }
}
