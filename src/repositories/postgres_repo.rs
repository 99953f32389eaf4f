use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bb8_postgres::bb8::{Pool, PooledConnection};
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::{NoTls, Row};
use tracing::{info, warn};
use crate::models::stats::{ApiUsage, EndpointStat};
use crate::models::user::User;
use crate::repositories::AppRepository;

pub const RETRY_LIMIT: usize = 5;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        first_name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        free_api_calls_remaining INT NOT NULL DEFAULT 20,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE
    );
    CREATE TABLE IF NOT EXISTS api_usage (
        id SERIAL PRIMARY KEY,
        user_id INT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
        total_api_calls INT NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS endpoints (
        id SERIAL PRIMARY KEY,
        method VARCHAR(10) NOT NULL,
        endpoint VARCHAR(255) NOT NULL,
        count INT NOT NULL DEFAULT 0,
        UNIQUE (method, endpoint)
    );
";

pub struct PostgresConnectionRepo {
    postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresConnectionRepo {
    pub fn new(
        postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
    ) -> Self {
        Self {
            postgres_connection
        }
    }

    async fn get_postgres_connection(
        &self,
    ) -> anyhow::Result<PooledConnection<PostgresConnectionManager<NoTls>>> {
        for _ in 0..RETRY_LIMIT {
            match self.postgres_connection.get().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!("Failed to retrieve postgres connection due to: {}, retrying in 3s", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
                    continue;
                }
            }
        }

        Err(anyhow!("Failed to retrieve a valid connection from postgres pool, BAILING"))
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        let conn = self.get_postgres_connection().await?;
        conn.batch_execute(SCHEMA)
            .await
            .context("Failed to create tables")?;
        info!("Database tables are in place");
        Ok(())
    }
}

#[async_trait]
impl AppRepository for PostgresConnectionRepo {
    async fn create_user(
        &self,
        first_name: &str,
        email: &str,
        password_hash: &str,
        free_api_calls: i32,
    ) -> anyhow::Result<Option<User>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = "
            WITH new_user AS (
                INSERT INTO users (first_name, email, password_hash, free_api_calls_remaining)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (email) DO NOTHING
                RETURNING id, first_name, email, password_hash, free_api_calls_remaining, is_admin
            ), new_usage AS (
                INSERT INTO api_usage (user_id) SELECT id FROM new_user
            )
            SELECT *, 0 AS total_api_calls FROM new_user;";

        let row = conn
            .query_opt(stmt, &[&first_name, &email, &password_hash, &free_api_calls])
            .await
            .with_context(|| format!("Failed to insert user {}", email))?;

        row.map(parse_row_into_user).transpose()
    }

    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = "
            SELECT u.id, u.first_name, u.email, u.password_hash, u.free_api_calls_remaining,
                   u.is_admin, COALESCE(a.total_api_calls, 0) AS total_api_calls
            FROM users u
            LEFT JOIN api_usage a ON a.user_id = u.id
            WHERE u.email = $1;";

        let row = conn
            .query_opt(stmt, &[&email])
            .await
            .with_context(|| format!("Failed to retrieve user {}", email))?;

        row.map(parse_row_into_user).transpose()
    }

    async fn update_user_password(
        &self,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let updated = conn
            .execute(
                "UPDATE users SET password_hash = $1 WHERE email = $2;",
                &[&password_hash, &email],
            )
            .await
            .with_context(|| format!("Failed to update password for {}", email))?;

        Ok(updated > 0)
    }

    async fn record_api_call(
        &self,
        user_id: i32,
    ) -> anyhow::Result<()> {
        let conn = self.get_postgres_connection().await?;
        let stmt = "
            WITH usage AS (
                INSERT INTO api_usage (user_id, total_api_calls) VALUES ($1, 1)
                ON CONFLICT (user_id) DO UPDATE SET total_api_calls = api_usage.total_api_calls + 1
            )
            UPDATE users
            SET free_api_calls_remaining = GREATEST(free_api_calls_remaining - 1, 0)
            WHERE id = $1;";

        conn.execute(stmt, &[&user_id])
            .await
            .with_context(|| format!("Failed to record api call for user {}", user_id))?;
        Ok(())
    }

    async fn log_endpoint_hit(
        &self,
        method: &str,
        endpoint: &str,
    ) -> anyhow::Result<()> {
        let conn = self.get_postgres_connection().await?;
        let stmt = "
            INSERT INTO endpoints (method, endpoint, count) VALUES ($1, $2, 1)
            ON CONFLICT (method, endpoint) DO UPDATE SET count = endpoints.count + 1;";

        conn.execute(stmt, &[&method, &endpoint])
            .await
            .with_context(|| format!("Failed to log hit on {} {}", method, endpoint))?;
        Ok(())
    }

    async fn get_endpoint_stats(&self) -> anyhow::Result<Vec<EndpointStat>> {
        let conn = self.get_postgres_connection().await?;
        let rows = conn
            .query(
                "SELECT method, endpoint, count FROM endpoints ORDER BY count DESC, endpoint;",
                &[],
            )
            .await
            .context("Failed to retrieve endpoint stats")?;

        rows.into_iter().map(parse_row_into_endpoint_stat).collect()
    }

    async fn get_api_usage(&self) -> anyhow::Result<Vec<ApiUsage>> {
        let conn = self.get_postgres_connection().await?;
        let stmt = "
            SELECT u.first_name, u.email, a.total_api_calls
            FROM api_usage a
            JOIN users u ON a.user_id = u.id
            ORDER BY a.total_api_calls DESC, u.email;";

        let rows = conn
            .query(stmt, &[])
            .await
            .context("Failed to retrieve api usage")?;

        rows.into_iter().map(parse_row_into_api_usage).collect()
    }
}

fn parse_row_into_user(
    row: Row,
) -> anyhow::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        free_api_calls_remaining: row.try_get("free_api_calls_remaining")?,
        total_api_calls: row.try_get("total_api_calls")?,
        is_admin: row.try_get("is_admin")?,
    })
}

fn parse_row_into_endpoint_stat(
    row: Row,
) -> anyhow::Result<EndpointStat> {
    Ok(EndpointStat {
        method: row.try_get("method")?,
        endpoint: row.try_get("endpoint")?,
        count: row.try_get("count")?,
    })
}

fn parse_row_into_api_usage(
    row: Row,
) -> anyhow::Result<ApiUsage> {
    Ok(ApiUsage {
        first_name: row.try_get("first_name")?,
        email: row.try_get("email")?,
        total_api_calls: row.try_get("total_api_calls")?,
    })
}
