use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::{
        Role,
        jwt::issue_token,
        password::{hash_password, verify_password},
    },
    db::{self, entities::user, user_repo},
    error::AppError,
    state::JwtKeys,
};

/// User fields safe to return to clients. The password hash never leaves
/// the service layer.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<user::Model> for PublicUser {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Clone, Copy)]
pub struct AuthService<'a> {
    db: &'a DatabaseConnection,
    jwt: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a DatabaseConnection, jwt: &'a JwtKeys) -> Self {
        Self { db, jwt }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: Option<Role>,
    ) -> Result<PublicUser, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(AppError::bad_request("Username, password and email required"));
        }

        if user_repo::find_by_username_or_email(self.db, username, email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Username or email already exists"));
        }

        let password_hash = hash_password(password)?;
        let role = role.unwrap_or(Role::User);

        let user = user_repo::create_user(self.db, username, email, &password_hash, role.as_str())
            .await
            .map_err(|err| {
                // Lost a concurrent-registration race; the unique index is
                // the final authority, same as the pre-check above.
                if db::is_unique_violation(&err) {
                    AppError::conflict("Username or email already exists")
                } else {
                    err.into()
                }
            })?;

        Ok(user.into())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let user = user_repo::find_by_username(self.db, username)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::unauthorized("Invalid password"));
        }

        // Best effort: a failed timestamp update must not fail the login.
        if let Err(err) = user_repo::set_last_login(self.db, &user.id).await {
            tracing::warn!("failed to update last login for {}: {err}", user.username);
        }

        let role = Role::try_from(user.role.as_str()).unwrap_or(Role::User);
        let token = issue_token(self.jwt, &user.id, role)?;

        Ok(LoginOutcome {
            token,
            user: user.into(),
        })
    }
}
