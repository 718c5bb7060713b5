//! JSON-over-HTTP planner client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::trait_def::TripPlanner;
use super::{PlanRequest, PlanResponse, UpstreamError};

/// Generation is slow; the upstream routinely takes minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(250);

const PLAN_PATH: &str = "/v1/trip-plans";

/// Posts [`PlanRequest`]s to `{base_url}/v1/trip-plans`.
#[derive(Debug, Clone)]
pub struct HttpTripPlanner {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTripPlanner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            client,
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint(&self) -> String {
        format!("{}{PLAN_PATH}", self.base_url)
    }

    async fn post(&self, request: &PlanRequest) -> Result<PlanResponse, UpstreamError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(UpstreamError::Decode)
    }
}

#[async_trait]
impl TripPlanner for HttpTripPlanner {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(&self, request: &PlanRequest) -> Result<PlanResponse, UpstreamError> {
        debug!(endpoint = %self.endpoint(), user_id = %request.user_id, "requesting trip plan");
        // Dropping the timed-out future cancels the in-flight request.
        match tokio::time::timeout(self.timeout, self.post(request)).await {
            Ok(result) => {
                if let Ok(resp) = &result {
                    debug!(count = resp.daily_plan.len(), "trip plan received");
                }
                result
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "trip planner timed out");
                Err(UpstreamError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    async fn spawn_server(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn request() -> PlanRequest {
        PlanRequest {
            user_id: "u1".to_string(),
            name: "Aegean".to_string(),
            description: String::new(),
            start_position: "İstanbul".to_string(),
            end_position: "Muğla".to_string(),
            start_date: "2025-08-13".to_string(),
            end_date: "2025-08-20".to_string(),
        }
    }

    #[test]
    fn endpoint_joins_base_url() {
        let planner = HttpTripPlanner::new("http://planner:50051/");
        assert_eq!(planner.endpoint(), "http://planner:50051/v1/trip-plans");
        assert_eq!(planner.timeout(), DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn decodes_successful_response() {
        let app = Router::new().route(
            PLAN_PATH,
            post(|Json(req): Json<PlanRequest>| async move {
                Json(serde_json::json!({
                    "trip": {
                        "user_id": req.user_id,
                        "name": req.name,
                        "route_summary": "**1. Day (x): Foça**\nswim"
                    },
                    "daily_plan": []
                }))
            }),
        );
        let base = spawn_server(app).await;

        let resp = HttpTripPlanner::new(base).generate(&request()).await.unwrap();
        let trip = resp.trip.unwrap();
        assert_eq!(trip.user_id, "u1");
        assert_eq!(trip.route_summary, "**1. Day (x): Foça**\nswim");
        assert!(resp.daily_plan.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let app = Router::new().route(
            PLAN_PATH,
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model overloaded") }),
        );
        let base = spawn_server(app).await;

        let err = HttpTripPlanner::new(base).generate(&request()).await.unwrap_err();
        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model overloaded");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_reported() {
        let app = Router::new().route(PLAN_PATH, post(|| async { "not json" }));
        let base = spawn_server(app).await;

        let err = HttpTripPlanner::new(base).generate(&request()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let app = Router::new().route(
            PLAN_PATH,
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({}))
            }),
        );
        let base = spawn_server(app).await;

        let planner = HttpTripPlanner::new(base).with_timeout(Duration::from_millis(100));
        let err = planner.generate(&request()).await.unwrap_err();
        assert!(
            matches!(err, UpstreamError::Timeout(d) if d == Duration::from_millis(100)),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpTripPlanner::new(format!("http://{addr}"))
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)), "got {err:?}");
    }
}
