use serde::Deserialize;

use crate::constants::{ERR_INVALID_EMAIL, ERR_INVALID_PLAN, MIN_PASSWORD_LEN};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{hash_password, user_id_from_email, verify_password};
use crate::store::Store;

use super::now;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub plan: String,
}

/// Fields a user may change on their profile
///
/// The email is not editable: the user ID is derived from it.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfile {
    pub username: String,
    pub plan: String,
}

#[derive(Clone)]
pub struct UserService {
    store: Store,
    pepper: String,
}

impl UserService {
    pub fn new(store: Store, pepper: impl Into<String>) -> Self {
        Self {
            store,
            pepper: pepper.into(),
        }
    }

    /// Register a new user
    ///
    /// Returns a conflict (`AlreadyExists`) when the email is already
    /// registered, since the ID is derived from the email.
    pub async fn register(&self, request: RegisterUser) -> Result<User> {
        let email = request.email.trim().to_ascii_lowercase();

        if !User::validate_email(&email) {
            tracing::warn!("Rejected registration with invalid email");
            return Err(AppError::InvalidInput(ERR_INVALID_EMAIL.to_string()));
        }
        validate_profile(&request.username, &request.plan)?;
        validate_password(&request.password)?;

        let id = user_id_from_email(&email);
        let password_hash = self.hash(&id, &request.password)?;
        let timestamp = now();

        let user = User {
            id,
            username: request.username.trim().to_string(),
            password_hash,
            email,
            plan: request.plan,
            created: timestamp,
            updated: timestamp,
        };

        self.store.create(user.clone()).await.map_err(|e| {
            if e.is_already_exists() {
                tracing::info!("Registration for existing user {}", user.id);
            }
            AppError::from(e)
        })?;

        tracing::info!("New user registered: {}", user.id);
        Ok(user)
    }

    /// Check an email/password pair
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let id = user_id_from_email(email);

        let user = match self.store.get::<User>(&id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Err(AppError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        if !verify_password(&user.id, password, &self.pepper, &user.password_hash) {
            tracing::warn!("Failed login for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        Ok(self.store.get::<User>(id).await?)
    }

    pub async fn update_profile(&self, id: &str, update: UpdateProfile) -> Result<User> {
        validate_profile(&update.username, &update.plan)?;

        let mut user = self.store.get::<User>(id).await?;
        user.username = update.username.trim().to_string();
        user.plan = update.plan;
        user.updated = now();

        self.store.update(user.clone()).await?;
        Ok(user)
    }

    pub async fn change_password(&self, id: &str, current: &str, new_password: &str) -> Result<()> {
        validate_password(new_password)?;

        let mut user = self.store.get::<User>(id).await?;
        if !verify_password(&user.id, current, &self.pepper, &user.password_hash) {
            return Err(AppError::InvalidCredentials);
        }

        user.password_hash = self.hash(&user.id, new_password)?;
        user.updated = now();
        self.store.update(user).await?;

        tracing::info!("Password changed for user {}", id);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete::<User>(id).await?;
        tracing::info!("User deleted: {}", id);
        Ok(())
    }

    fn hash(&self, id: &str, password: &str) -> Result<String> {
        hash_password(id, password, &self.pepper)
            .ok_or_else(|| AppError::InvalidInput("Password could not be processed".to_string()))
    }
}

fn validate_profile(username: &str, plan: &str) -> Result<()> {
    if !User::validate_username(username) {
        return Err(AppError::InvalidInput("Invalid username".to_string()));
    }
    if !User::validate_plan(plan) {
        return Err(AppError::InvalidInput(ERR_INVALID_PLAN.to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
