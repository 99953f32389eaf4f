use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub email: String,
    pub password_hash: String,
    pub free_api_calls_remaining: i32,
    pub total_api_calls: i32,
    pub is_admin: bool,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct UserProfile {
    pub first_name: String,
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub total_api_calls: i32,
    pub free_api_calls_remaining: i32,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            total_api_calls: user.total_api_calls,
            free_api_calls_remaining: user.free_api_calls_remaining,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub first_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PasswordReset {
    pub token: String,
    pub new_password: String,
}
