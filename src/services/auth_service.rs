use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, UserType},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{User, UserProfile},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn issue_token(config: &AppConfig, user: &User) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        name: user.name.clone(),
        is_admin: user.is_admin,
        is_restaurant: user.is_restaurant,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Store a new account. Emails are unique; role flags are fixed here for
/// the life of the account.
pub async fn create_user(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    is_admin: bool,
    is_restaurant: bool,
) -> AppResult<User> {
    let user = User {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password_hash: hash_password(password)?,
        is_admin,
        is_restaurant,
        created_at: Utc::now(),
    };

    state
        .users
        .append_checked(user, |users| {
            if users.iter().any(|u| u.email.eq_ignore_ascii_case(email.trim())) {
                return Err(AppError::BadRequest("Email is already taken".to_string()));
            }
            Ok(())
        })
        .await
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    payload.validate()?;
    let is_restaurant = payload.user_type == UserType::Restaurant;
    let user = create_user(
        state,
        &payload.name,
        &payload.email,
        &payload.password,
        false,
        is_restaurant,
    )
    .await?;

    tracing::info!(user_id = %user.id, is_restaurant, "user registered");
    state
        .audit
        .record(
            Some(user.id),
            "user_register",
            "users",
            serde_json::json!({ "user_id": user.id }),
        )
        .await;

    Ok(ApiResponse::success("User created", user.into(), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }

    let user = state
        .users
        .find_one_by(|u| u.email.eq_ignore_ascii_case(email.trim()))
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let token = issue_token(&state.config, &user)?;

    state
        .audit
        .record(
            Some(user.id),
            "user_login",
            "users",
            serde_json::json!({ "user_id": user.id }),
        )
        .await;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        user: user.into(),
    };

    Ok(ApiResponse::success(
        format!("Welcome back, {}!", resp.user.name),
        resp,
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let found = state.users.find_by_id(user.user_id).await?;
    let found = match found {
        Some(u) => u,
        None => return Err(AppError::Unauthorized),
    };
    Ok(ApiResponse::success("OK", found.into(), Some(Meta::empty())))
}
