use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use reqwest::Url;
use serde_json::json;
use tracing::{info, warn};
use crate::controller::api_error::ApiError;
use crate::controller::AppState;
use crate::helpers::auth::{
    access_token_cookie, clear_access_token_cookie, create_access_token,
    create_password_reset_token, decode_password_reset_token, hash_password, reset_token_matches,
    verify_password,
};
use crate::helpers::auth_extractor::AuthenticatedUser;
use crate::models::user::{LoginRequest, PasswordReset, PasswordResetRequest, RegisterRequest, UserProfile};

const MIN_PASSWORD_LENGTH: usize = 6;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/verify-token", get(verify_token))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route_layer(Extension(app_state))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn check_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub async fn register(
    Extension(app_state): Extension<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let first_name = body.first_name.trim();
    let email = normalize_email(&body.email);
    if first_name.is_empty() {
        return Err(ApiError::BadRequest("First name is required".to_string()));
    }
    if !is_plausible_email(&email) {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    check_password(&body.password)?;

    let password_hash = hash_password(body.password, app_state.auth.password_hash_cost).await?;
    let created = app_state
        .repo
        .create_user(first_name, &email, &password_hash, app_state.auth.free_api_calls)
        .await?;

    return match created {
        Some(user) => {
            info!("Registered user {}", user.id);
            Ok((StatusCode::CREATED, Json(json!({ "message": "User registered successfully" }))))
        }
        None => Err(ApiError::Conflict("Email already registered".to_string())),
    };
}

pub async fn login(
    Extension(app_state): Extension<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&body.email);
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = app_state
        .repo
        .get_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(body.password, user.password_hash.clone()).await? {
        warn!("Failed login attempt for user {}", user.id);
        return Err(invalid());
    }

    let token = create_access_token(&user, &app_state.auth)?;
    let cookie = access_token_cookie(&token, &app_state.auth);

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(json!({
            "message": "Login successful",
            "isAdmin": user.is_admin,
        })),
    ))
}

pub async fn logout(
    Extension(app_state): Extension<AppState>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(SET_COOKIE, clear_access_token_cookie(&app_state.auth))],
        Json(json!({ "message": "Logged out" })),
    )
}

pub async fn verify_token(
    Extension(app_state): Extension<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let stored = app_state
        .repo
        .get_user_by_email(&user.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    Ok((StatusCode::OK, Json(UserProfile::from(&stored))))
}

pub async fn forgot_password(
    Extension(app_state): Extension<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&body.email);
    let accepted = (
        StatusCode::OK,
        Json(json!({ "message": "If the email is registered, a reset link has been sent" })),
    );

    let user = match app_state.repo.get_user_by_email(&email).await? {
        Some(user) => user,
        None => return Ok(accepted),
    };

    let token = create_password_reset_token(&user, &app_state.auth)?;
    let link = Url::parse_with_params(
        &format!("{}/reset-password.html", app_state.auth.frontend_url.trim_end_matches('/')),
        &[("token", token.as_str())],
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid FRONTEND_URL: {}", e)))?;

    let text = format!(
        "Use the link below to reset your password. It expires in {} minutes.\n\n{}",
        app_state.auth.reset_password_expire_minutes, link
    );
    // Answer is the same whether or not the mail went out
    if let Err(e) = app_state.mailer.send(&email, "Reset your password", &text).await {
        warn!("Failed to send password reset email to user {}: {:#}", user.id, e);
    }

    Ok(accepted)
}

pub async fn reset_password(
    Extension(app_state): Extension<AppState>,
    Json(body): Json<PasswordReset>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid or expired reset token".to_string());
    let claims = decode_password_reset_token(&body.token, &app_state.auth).ok_or_else(invalid)?;
    check_password(&body.new_password)?;

    let user = app_state
        .repo
        .get_user_by_email(&claims.sub)
        .await?
        .filter(|user| reset_token_matches(&claims, user))
        .ok_or_else(invalid)?;

    let password_hash = hash_password(body.new_password, app_state.auth.password_hash_cost).await?;
    if !app_state.repo.update_user_password(&user.email, &password_hash).await? {
        return Err(invalid());
    }

    info!("Password reset for user {}", user.id);
    Ok((StatusCode::OK, Json(json!({ "message": "Password has been reset" }))))
}
