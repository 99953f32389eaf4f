use async_trait::async_trait;
use crate::models::stats::{ApiUsage, EndpointStat};
use crate::models::user::User;

#[cfg(test)]
pub mod memory_repo;
pub mod postgres_repo;

/// Users, per-user usage and endpoint hit counters.
#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Returns `None` when the e-mail is already registered.
    async fn create_user(
        &self,
        first_name: &str,
        email: &str,
        password_hash: &str,
        free_api_calls: i32,
    ) -> anyhow::Result<Option<User>>;

    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<User>>;

    /// Returns whether a user with that e-mail existed.
    async fn update_user_password(
        &self,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<bool>;

    /// Counts one recommendation call against the user's quota.
    async fn record_api_call(
        &self,
        user_id: i32,
    ) -> anyhow::Result<()>;

    async fn log_endpoint_hit(
        &self,
        method: &str,
        endpoint: &str,
    ) -> anyhow::Result<()>;

    async fn get_endpoint_stats(&self) -> anyhow::Result<Vec<EndpointStat>>;

    async fn get_api_usage(&self) -> anyhow::Result<Vec<ApiUsage>>;
}
