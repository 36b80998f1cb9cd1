//! Account endpoints: registration, email verification, login and profile

use std::collections::BTreeSet;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::middleware::Context;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Json, ValidatedJson};
use crate::domain::user::User;
use crate::domain::verification::is_well_formed_code;
use crate::infrastructure::auth::AuthSession;
use crate::infrastructure::user::{normalize_email, LoginRequest, RegisterRequest};

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(current_user))
        .route("/logout", post(logout))
        .route("/verify-email", post(verify_email))
        .route("/resend-verification", post(resend_verification))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 100, message = "Password must be 8-100 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name must be 1-50 characters"))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub username_or_email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailBody {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(custom(function = "validate_code"))]
    pub verification_code: String,
}

fn validate_code(code: &str) -> Result<(), ValidationError> {
    if is_well_formed_code(code) {
        Ok(())
    } else {
        Err(ValidationError::new("verification_code")
            .with_message("Verification code must be 6 digits".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResendVerificationBody {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

/// Public profile; never carries the password hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub enabled: bool,
    pub email_verified: bool,
    pub roles: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().value(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            enabled: user.is_enabled(),
            email_verified: user.is_email_verified(),
            roles: user.roles(),
            created_at: user.created_at(),
        }
    }
}

/// Profile plus tokens; registration answers without tokens
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    pub user: UserProfile,
}

impl AuthResponse {
    fn profile_only(user: &User) -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            token_type: None,
            expires_in: None,
            user: user.into(),
        }
    }
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: Some(session.tokens.access_token),
            refresh_token: Some(session.tokens.refresh_token),
            token_type: Some(session.tokens.token_type),
            expires_in: Some(session.tokens.expires_in),
            user: UserProfile::from(&session.user),
        }
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterBody>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let user = state
        .auth
        .register(RegisterRequest {
            username: body.username,
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        "User registered successfully. Please check your email for the verification code",
        AuthResponse::profile_only(&user),
    )))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginBody>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let session = state
        .auth
        .login(LoginRequest {
            username_or_email: body.username_or_email,
            password: body.password,
        })
        .await?;

    Ok(Json(ApiResponse::success("Login successful", session.into())))
}

/// GET /api/auth/me
pub async fn current_user(
    State(state): State<AppState>,
    Context(ctx): Context,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user = state.auth.current_user(&ctx).await?;

    Ok(Json(ApiResponse::success(
        "User profile retrieved",
        UserProfile::from(&user),
    )))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client discards them.
pub async fn logout(
    State(state): State<AppState>,
    Context(mut ctx): Context,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ctx.require_principal()?;
    state.auth.logout(&mut ctx);

    Ok(Json(ApiResponse::message("Logout successful")))
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<VerifyEmailBody>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let session = state
        .verification
        .verify(&normalize_email(&body.email), &body.verification_code)
        .await?;

    Ok(Json(ApiResponse::success(
        "Email verified successfully",
        session.into(),
    )))
}

/// POST /api/auth/resend-verification
pub async fn resend_verification(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ResendVerificationBody>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .verification
        .resend(&normalize_email(&body.email))
        .await?;

    Ok(Json(ApiResponse::message(
        "Verification code resent successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_body_validation() {
        let body = RegisterBody {
            username: "al".to_string(),
            email: "alice@example.com".to_string(),
            password: "Password123".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
        };

        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn test_verify_body_requires_six_digits() {
        let valid = VerifyEmailBody {
            email: "alice@example.com".to_string(),
            verification_code: "012345".to_string(),
        };
        let invalid = VerifyEmailBody {
            email: "alice@example.com".to_string(),
            verification_code: "12a456".to_string(),
        };

        assert!(valid.validate().is_ok());
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_register_response_omits_tokens() {
        let user = User::with_id(
            crate::domain::user::UserId::new(1),
            crate::domain::user::NewUser::registration(
                "alice",
                "alice@example.com",
                "hash",
                "Alice",
                "Smith",
                Utc::now(),
            ),
        );

        let json = serde_json::to_value(AuthResponse::profile_only(&user)).unwrap();

        assert!(json.get("accessToken").is_none());
        assert_eq!(json["user"]["username"], "alice");
        assert_eq!(json["user"]["emailVerified"], false);
        assert!(json["user"].get("passwordHash").is_none());
    }
}
