use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{error, info, instrument};

use crate::model::user::{Role, User};
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};

#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UserAuthResponse {
    pub user: UserWithoutPassword,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UserWithoutPassword {
    pub id: Option<ObjectId>,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub company: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<User> for UserWithoutPassword {
    fn from(user: User) -> Self {
        UserWithoutPassword {
            id: user.id,
            phone: user.phone,
            name: user.name,
            email: user.email,
            role: user.role,
            company: user.company,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn register(&self, user: User, password: String) -> Result<UserAuthResponse, ServiceError>;
    async fn login(&self, phone: String, password: String) -> Result<UserAuthResponse, ServiceError>;
    async fn refresh_token(&self, refresh_token: String) -> Result<AuthTokens, ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>, jwt_utils: Arc<JwtTokenUtilsImpl>) -> Self {
        Self {
            user_repo,
            jwt_utils,
        }
    }

    fn token_pair_for(&self, user: &User) -> Result<AuthTokens, ServiceError> {
        let tokens = self
            .jwt_utils
            .generate_token_pair(
                &user.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                &user.phone,
                user.role.as_str(),
            )
            .map_err(|e| ServiceError::InternalError(format!("JWT error: {}", e)))?;
        Ok(AuthTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        })
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, user, password), fields(phone = %user.phone, role = %user.role))]
    async fn register(
        &self,
        mut user: User,
        password: String,
    ) -> Result<UserAuthResponse, ServiceError> {
        info!("Registering new user");

        if let Err(problems) = PasswordUtilsImpl::validate_password_strength(&password) {
            return Err(ServiceError::InvalidInput(problems.join("; ")));
        }
        let hash = PasswordUtilsImpl::hash_password(&password)
            .map_err(|e| ServiceError::InvalidInput(format!("Password hash error: {}", e)))?;
        user.password_hash = Some(hash);

        let inserted = self.user_repo.insert(user).await;
        match &inserted {
            Ok(_) => info!("User inserted successfully"),
            Err(e) => error!("Failed to insert user: {e}"),
        }
        let inserted = inserted?;

        let tokens = self.token_pair_for(&inserted)?;
        Ok(UserAuthResponse {
            user: inserted.into(),
            tokens,
        })
    }

    #[instrument(skip(self, password), fields(phone = %phone))]
    async fn login(
        &self,
        phone: String,
        password: String,
    ) -> Result<UserAuthResponse, ServiceError> {
        info!("User login attempt");

        let user = self
            .user_repo
            .find_by_phone(&phone)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        // Accounts created through an external provider carry no local hash
        let hash = user.password_hash.clone().ok_or_else(|| {
            ServiceError::InvalidInput("Account has no local password".to_string())
        })?;

        let valid = PasswordUtilsImpl::verify_password(&password, &hash)
            .map_err(|e| ServiceError::InvalidInput(format!("Password verify error: {}", e)))?;
        if !valid {
            error!("Invalid credentials for phone: {}", phone);
            return Err(ServiceError::InvalidInput("Invalid credentials".to_string()));
        }

        let tokens = self.token_pair_for(&user)?;
        info!("User logged in successfully");
        Ok(UserAuthResponse {
            user: user.into(),
            tokens,
        })
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_token(&self, refresh_token: String) -> Result<AuthTokens, ServiceError> {
        info!("Refreshing token");
        let claims = self
            .jwt_utils
            .validate_refresh_token(&refresh_token)
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid refresh token: {}", e)))?;
        let tokens = self
            .jwt_utils
            .generate_token_pair(&claims.sub, &claims.phone, &claims.role)
            .map_err(|e| ServiceError::InternalError(format!("JWT error: {}", e)))?;
        info!("Token refreshed successfully");
        Ok(AuthTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        })
    }
}
