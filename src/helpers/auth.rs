use anyhow::Context;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use crate::models::user::User;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
const PASSWORD_RESET_PURPOSE: &str = "password_reset";

#[derive(Clone)]
pub struct AuthSettings {
    pub secret_key: String,
    pub reset_password_secret_key: String,
    pub access_token_expire_minutes: i64,
    pub reset_password_expire_minutes: i64,
    pub password_hash_cost: u32,
    pub secure_cookies: bool,
    pub free_api_calls: i32,
    pub frontend_url: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub user_id: i32,
    pub is_admin: bool,
    pub exp: i64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ResetClaims {
    pub sub: String,
    pub purpose: String,
    /// Salt of the password hash the token was issued against.
    pub fp: String,
    pub exp: i64,
}

fn expiry_after(minutes: i64) -> i64 {
    OffsetDateTime::now_utc().unix_timestamp() + minutes * 60
}

pub fn create_access_token(
    user: &User,
    settings: &AuthSettings,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        is_admin: user.is_admin,
        exp: expiry_after(settings.access_token_expire_minutes),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret_key.as_bytes()),
    )
    .context("Failed to sign access token")
}

pub fn decode_access_token(
    token: &str,
    settings: &AuthSettings,
) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret_key.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

pub fn create_password_reset_token(
    user: &User,
    settings: &AuthSettings,
) -> anyhow::Result<String> {
    let claims = ResetClaims {
        sub: user.email.clone(),
        purpose: PASSWORD_RESET_PURPOSE.to_string(),
        fp: password_fingerprint(&user.password_hash),
        exp: expiry_after(settings.reset_password_expire_minutes),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.reset_password_secret_key.as_bytes()),
    )
    .context("Failed to sign password reset token")
}

pub fn decode_password_reset_token(
    token: &str,
    settings: &AuthSettings,
) -> Option<ResetClaims> {
    decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(settings.reset_password_secret_key.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
    .filter(|claims| claims.purpose == PASSWORD_RESET_PURPOSE)
}

/// A reset token is only good for the password it was issued against.
pub fn reset_token_matches(
    claims: &ResetClaims,
    user: &User,
) -> bool {
    claims.sub == user.email && claims.fp == password_fingerprint(&user.password_hash)
}

// bcrypt hashes look like `$2b$<cost>$<22 char salt><31 char digest>`, the salt is fresh on every hash
fn password_fingerprint(password_hash: &str) -> String {
    password_hash
        .get(7..29)
        .unwrap_or(password_hash)
        .to_string()
}

/// Runs bcrypt on the blocking pool.
pub async fn hash_password(
    password: String,
    cost: u32,
) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("Password hashing task panicked")?
        .context("Failed to hash password")
}

pub async fn verify_password(
    password: String,
    password_hash: String,
) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .context("Password verification task panicked")?
        .context("Stored password hash is malformed")
}

pub fn access_token_cookie(
    token: &str,
    settings: &AuthSettings,
) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}",
        ACCESS_TOKEN_COOKIE,
        token,
        settings.access_token_expire_minutes * 60
    );
    push_cookie_attributes(&mut cookie, settings.secure_cookies);
    cookie
}

pub fn clear_access_token_cookie(settings: &AuthSettings) -> String {
    let mut cookie = format!("{}=; HttpOnly; Path=/; Max-Age=0", ACCESS_TOKEN_COOKIE);
    push_cookie_attributes(&mut cookie, settings.secure_cookies);
    cookie
}

fn push_cookie_attributes(cookie: &mut String, secure: bool) {
    // Cross-site frontends only get the cookie back with SameSite=None, which requires Secure
    if secure {
        cookie.push_str("; Secure; SameSite=None");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
}

/// Reads the access token from the cookie, falling back to a bearer header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    })
}
