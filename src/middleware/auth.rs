use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

/// The session carried by a request: who is signed in and with which roles.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub is_admin: bool,
    pub is_restaurant: bool,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_restaurant(&self) -> bool {
        self.is_restaurant
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_restaurant(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_restaurant() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        name: decoded.claims.name,
        is_admin: decoded.claims.is_admin,
        is_restaurant: decoded.claims.is_restaurant,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::BadRequest("Invalid Authorization scheme".into()))?
            .trim();

        decode_token(token, &state.config.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(is_admin: bool, is_restaurant: bool) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            name: "Sam".into(),
            is_admin,
            is_restaurant,
        }
    }

    #[test]
    fn role_gates_are_independent() {
        let customer = session(false, false);
        let operator = session(false, true);
        let admin = session(true, false);

        assert!(matches!(ensure_admin(&customer), Err(AppError::Forbidden)));
        assert!(matches!(ensure_restaurant(&customer), Err(AppError::Forbidden)));
        assert!(ensure_restaurant(&operator).is_ok());
        assert!(matches!(ensure_admin(&operator), Err(AppError::Forbidden)));
        assert!(ensure_admin(&admin).is_ok());
        assert!(matches!(ensure_restaurant(&admin), Err(AppError::Forbidden)));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let result = decode_token("not-a-jwt", "secret");
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
