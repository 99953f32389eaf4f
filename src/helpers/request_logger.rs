use std::future::Future;
use std::time::Duration;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};
use crate::controller::AppState;

/// How long a request waits on a usage counter write before moving on.
pub const BOOKKEEPING_WAIT: Duration = Duration::from_millis(250);

fn should_log(method: &Method, path: &str) -> bool {
    *method != Method::OPTIONS && !path.starts_with("/static") && path != "/favicon.ico"
}

/// Runs a counter write on its own task and waits at most `BOOKKEEPING_WAIT`
/// for it. A slow or failing database never holds up or fails the request.
pub async fn record_in_background<F>(
    what: &'static str,
    write: F,
) where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        if let Err(e) = write.await {
            warn!("Failed to {}: {:#}", what, e);
        }
    });
    if tokio::time::timeout(BOOKKEEPING_WAIT, handle).await.is_err() {
        debug!("Still trying to {}, not waiting any longer", what);
    }
}

/// Counts every request per method and path in the endpoints table.
pub async fn log_endpoint_stats<B>(
    State(app_state): State<AppState>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if should_log(&method, &path) {
        let repo = app_state.repo.clone();
        record_in_background("log endpoint hit", async move {
            repo.log_endpoint_hit(method.as_str(), &path).await
        })
        .await;
    }

    next.run(request).await
}
