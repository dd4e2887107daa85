use super::dto::{AuthResponse, LoginRequest, RegisterRequest, TokenClaims, UserResponse};
use super::model::UserRole;
use super::repository::AuthRepository;
use crate::common::error::{AppError, AppResult};
use crate::common::security;
use crate::state::AppState;
use anyhow::anyhow;
use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use tracing::info;
use uuid::Uuid;

/// Twelve hours; there is no refresh flow.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 12 * 60 * 60;

pub struct AuthService;

impl AuthService {
    pub async fn register(state: AppState, req: RegisterRequest) -> AppResult<UserResponse> {
        if AuthRepository::find_user_by_email(&state.db, &req.email)
            .await?
            .is_some()
        {
            return Err(AppError::validation("Email already exists"));
        }

        if AuthRepository::find_user_by_username(&state.db, &req.username)
            .await?
            .is_some()
        {
            return Err(AppError::validation("Username already exists"));
        }

        let password_hash = security::hash_password(&req.password)?;

        let user = AuthRepository::create_user(&state.db, &req.username, &req.email, &password_hash).await?;
        info!("Registered user {} as {}", user.username, user.role);

        Ok(user.into())
    }

    pub async fn login(state: AppState, req: LoginRequest) -> AppResult<AuthResponse> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = AuthRepository::find_user_by_email(&state.db, &req.email)
            .await?
            .ok_or_else(invalid)?;

        security::verify_password(&req.password, &user.password_hash).map_err(|_| invalid())?;

        let access_token = Self::create_access_token(user.id, user.role, &state.config.jwt_secret)?;

        Ok(AuthResponse {
            access_token,
            access_token_expires_in: ACCESS_TOKEN_TTL_SECS,
            user: user.into(),
        })
    }

    pub async fn me(state: AppState, user_id: Uuid) -> AppResult<UserResponse> {
        AuthRepository::find_user_by_id(&state.db, user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub fn create_access_token(user_id: Uuid, role: UserRole, secret: &str) -> AppResult<String> {
        let now = get_current_timestamp();

        let claims = TokenClaims {
            sub: user_id,
            role: role.to_string(),
            exp: (now + ACCESS_TOKEN_TTL_SECS) as usize,
            iat: now as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow!("Failed to sign token: {}", e)))
    }
}
