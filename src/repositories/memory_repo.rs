use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use crate::models::stats::{ApiUsage, EndpointStat};
use crate::models::user::User;
use crate::repositories::AppRepository;

/// In-process stand-in for Postgres used by the HTTP tests.
#[derive(Default)]
pub struct MemoryRepo {
    users: Mutex<Vec<User>>,
    endpoints: Mutex<Vec<EndpointStat>>,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryRepo {
    /// Makes usage and endpoint counter writes hang for `delay`, like a database that stopped answering.
    pub fn stall_writes(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }

    async fn wait_if_stalled(&self) {
        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn promote_to_admin(&self, email: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            user.is_admin = true;
        }
    }
}

#[async_trait]
impl AppRepository for MemoryRepo {
    async fn create_user(
        &self,
        first_name: &str,
        email: &str,
        password_hash: &str,
        free_api_calls: i32,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Ok(None);
        }
        let user = User {
            id: users.len() as i32 + 1,
            first_name: first_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            free_api_calls_remaining: free_api_calls,
            total_api_calls: 0,
            is_admin: false,
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn update_user_password(
        &self,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_api_call(
        &self,
        user_id: i32,
    ) -> anyhow::Result<()> {
        self.wait_if_stalled().await;
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.total_api_calls += 1;
            user.free_api_calls_remaining = (user.free_api_calls_remaining - 1).max(0);
        }
        Ok(())
    }

    async fn log_endpoint_hit(
        &self,
        method: &str,
        endpoint: &str,
    ) -> anyhow::Result<()> {
        self.wait_if_stalled().await;
        let mut endpoints = self.endpoints.lock().unwrap();
        match endpoints
            .iter_mut()
            .find(|e| e.method == method && e.endpoint == endpoint)
        {
            Some(stat) => stat.count += 1,
            None => endpoints.push(EndpointStat {
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                count: 1,
            }),
        }
        Ok(())
    }

    async fn get_endpoint_stats(&self) -> anyhow::Result<Vec<EndpointStat>> {
        Ok(self.endpoints.lock().unwrap().clone())
    }

    async fn get_api_usage(&self) -> anyhow::Result<Vec<ApiUsage>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .map(|u| ApiUsage {
                first_name: u.first_name.clone(),
                email: u.email.clone(),
                total_api_calls: u.total_api_calls,
            })
            .collect())
    }
}
