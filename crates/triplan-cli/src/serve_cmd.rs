use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use triplan_core::itinerary::Extractor;
use triplan_core::planner::{PlanRequest, TripPlanner};
use triplan_core::trip::{self, TripError, TripPreview};
use triplan_db::models::{NewLocation, NewTrip, TripWithLocations};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
    /// Date failures still answer with an (empty) itinerary.
    empty_daily_plan: bool,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            empty_daily_plan: false,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl From<TripError> for AppError {
    fn from(err: TripError) -> Self {
        match err {
            TripError::NotFound(_) => Self::not_found(err.to_string()),
            TripError::DateParseFailure(_) => Self {
                empty_daily_plan: true,
                ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            },
            TripError::UpstreamUnavailable(_) => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
            TripError::PersistenceFailure(_) => {
                tracing::error!(error = %err, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let mut body = serde_json::json!({ "error": self.message });
        if self.empty_daily_plan {
            body["daily_plan"] = serde_json::json!([]);
        }
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SaveTripRequest {
    #[serde(flatten)]
    pub trip: NewTrip,
    #[serde(default)]
    pub locations: Vec<NewLocation>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TripListResponse {
    pub trips: Vec<TripWithLocations>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub planner: Arc<dyn TripPlanner>,
    pub extractor: Arc<Extractor>,
}

/// CORS for a single browser origin, with credentials.
pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("invalid allowed origin {allowed_origin:?}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true))
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/v1/trip/preview", post(preview))
        .route("/api/v1/trip/save", post(save))
        .route("/api/v1/trip/list", get(list))
        .route("/api/v1/trip/{id}", get(get_trip).delete(delete_trip))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, cors: CorsLayer, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state, cors);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("triplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("triplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn preview(
    State(state): State<AppState>,
    body: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<TripPreview>, AppError> {
    let Json(request) = body?;
    let preview = trip::preview_trip(state.planner.as_ref(), &state.extractor, &request).await?;
    Ok(Json(preview))
}

async fn save(
    State(state): State<AppState>,
    body: Result<Json<SaveTripRequest>, JsonRejection>,
) -> Result<axum::response::Response, AppError> {
    let Json(req) = body?;
    if req.trip.user_id.trim().is_empty() {
        return Err(AppError::bad_request("user_id is required"));
    }
    let saved = trip::save_trip_with_locations(&state.pool, &req.trip, &req.locations).await?;
    Ok((StatusCode::CREATED, Json(saved)).into_response())
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<TripListResponse>, AppError> {
    let user_id = params
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("user_id query parameter is required"))?;
    let trips = trip::list_user_trips(&state.pool, &user_id).await?;
    Ok(Json(TripListResponse { trips }))
}

async fn get_trip(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TripWithLocations>, AppError> {
    let Path(id) = id?;
    let trip = trip::get_trip_with_locations(&state.pool, id).await?;
    Ok(Json(trip))
}

async fn delete_trip(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Path(id) = id?;
    trip::delete_trip(&state.pool, id).await?;
    Ok(Json(serde_json::json!({ "status": "trip deleted" })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::PgPool;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use triplan_core::itinerary::Extractor;
    use triplan_core::planner::{PlanRequest, PlanResponse, TripPlanner, TripSummary, UpstreamError};
    use triplan_test_utils::{create_test_db, drop_test_db};

    use super::{AppState, build_router, cors_layer};

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    /// Answers every request with a fixed route summary, or times out.
    struct FakePlanner {
        route_summary: Option<&'static str>,
    }

    #[async_trait]
    impl TripPlanner for FakePlanner {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate(&self, request: &PlanRequest) -> Result<PlanResponse, UpstreamError> {
            let summary = self
                .route_summary
                .ok_or(UpstreamError::Timeout(Duration::from_secs(1)))?;
            Ok(PlanResponse {
                trip: Some(TripSummary {
                    route_summary: summary.to_string(),
                    ..TripSummary::from(request)
                }),
                daily_plan: Vec::new(),
            })
        }
    }

    const SUMMARY: &str = "**1. Gün (2025-08-13): İstanbul - Ayvalık**\nCunda adası\n**2. Gün (2025-08-14): Ayvalık - Foça**\nSiren kayalıkları";

    fn state(pool: PgPool, route_summary: Option<&'static str>) -> AppState {
        AppState {
            pool,
            planner: Arc::new(FakePlanner { route_summary }),
            extractor: Arc::new(Extractor::default()),
        }
    }

    /// A pool that never connects, for handlers that must not touch the store.
    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgresql://localhost:1/unused")
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(state: AppState, method: &str, uri: &str, body: Option<serde_json::Value>) -> axum::response::Response {
        let app = build_router(state, cors_layer("http://localhost:3000").unwrap());
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn preview_body(start_date: &str) -> serde_json::Value {
        serde_json::json!({
            "user_id": "user-1",
            "name": "Aegean",
            "description": "summer",
            "start_position": "İstanbul",
            "end_position": "Muğla",
            "start_date": start_date,
            "end_date": "2025-08-20"
        })
    }

    fn save_body(user_id: &str, locations: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "user_id": user_id,
            "name": "Aegean",
            "description": "",
            "start_position": "İstanbul",
            "end_position": "Muğla",
            "start_date": "2025-08-13",
            "end_date": "2025-08-20",
            "locations": locations
        })
    }

    // -----------------------------------------------------------------------
    // Preview
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_preview_parses_route_summary() {
        let resp = send(
            state(lazy_pool(), Some(SUMMARY)),
            "POST",
            "/api/v1/trip/preview",
            Some(preview_body("2025-08-13")),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["source"], "parsed");
        assert_eq!(json["trip"]["name"], "Aegean");
        let days = json["daily_plan"].as_array().expect("daily_plan array");
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["day"], 1);
        assert_eq!(days[0]["date"], "2025-08-13");
        assert_eq!(days[0]["name"], "Ayvalık");
        assert_eq!(days[1]["name"], "Foça");
        assert_eq!(days[1]["notes"], "Siren kayalıkları");
    }

    #[tokio::test]
    async fn test_preview_falls_back() {
        let resp = send(
            state(lazy_pool(), Some("no headers at all")),
            "POST",
            "/api/v1/trip/preview",
            Some(preview_body("2025-08-13")),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["daily_plan"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_preview_bad_date_is_422() {
        let resp = send(
            state(lazy_pool(), Some(SUMMARY)),
            "POST",
            "/api/v1/trip/preview",
            Some(preview_body("not-a-date")),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("not-a-date"));
        assert_eq!(json["daily_plan"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_preview_upstream_failure_is_502() {
        let resp = send(
            state(lazy_pool(), None),
            "POST",
            "/api/v1/trip/preview",
            Some(preview_body("2025-08-13")),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("planner"));
    }

    #[tokio::test]
    async fn test_preview_invalid_body_is_400() {
        let resp = send(
            state(lazy_pool(), Some(SUMMARY)),
            "POST",
            "/api/v1/trip/preview",
            Some(serde_json::json!({ "name": 5 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await.get("error").is_some());
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let app = build_router(
            state(lazy_pool(), Some(SUMMARY)),
            cors_layer("http://localhost:3000").unwrap(),
        );
        let resp = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/v1/trip/save")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let headers = resp.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }

    #[test]
    fn test_cors_layer_rejects_bad_origin() {
        assert!(cors_layer("bad\norigin").is_err());
    }

    // -----------------------------------------------------------------------
    // Store-backed routes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_save_get_list_delete() {
        let (pool, db_name) = create_test_db().await;
        let st = state(pool.clone(), Some(SUMMARY));

        let resp = send(
            st.clone(),
            "POST",
            "/api/v1/trip/save",
            Some(save_body(
                "user-1",
                serde_json::json!([
                    { "name": "Ayvalık", "address": "Ayvalık, Balıkesir", "latitude": 39.31, "longitude": 26.69 },
                    { "name": "Foça", "notes": "Siren rocks" }
                ]),
            )),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let saved = body_json(resp).await;
        let id = saved["id"].as_str().expect("trip id").to_string();
        assert_eq!(saved["description"], serde_json::Value::Null);
        assert_eq!(saved["locations"].as_array().unwrap().len(), 2);

        let resp = send(st.clone(), "GET", &format!("/api/v1/trip/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched = body_json(resp).await;
        assert_eq!(fetched["name"], "Aegean");
        assert_eq!(fetched["locations"][0]["name"], "Ayvalık");
        assert_eq!(fetched["locations"][0]["latitude"], 39.31);
        assert_eq!(fetched["locations"][1]["address"], serde_json::Value::Null);
        assert_eq!(fetched["locations"][1]["latitude"], 0.0);

        let resp = send(st.clone(), "GET", "/api/v1/trip/list?user_id=user-1", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let listed = body_json(resp).await;
        assert_eq!(listed["trips"].as_array().unwrap().len(), 1);
        assert_eq!(listed["trips"][0]["id"], id.as_str());

        let resp = send(st.clone(), "DELETE", &format!("/api/v1/trip/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "trip deleted");

        let resp = send(st.clone(), "GET", &format!("/api/v1/trip/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_save_with_bad_location_is_500_and_stores_nothing() {
        let (pool, db_name) = create_test_db().await;
        let st = state(pool.clone(), Some(SUMMARY));

        let resp = send(
            st.clone(),
            "POST",
            "/api/v1/trip/save",
            Some(save_body(
                "user-1",
                serde_json::json!([{ "name": "Ayvalık" }, { "name": "" }, { "name": "Foça" }]),
            )),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = send(st, "GET", "/api/v1/trip/list?user_id=user-1", None).await;
        assert_eq!(body_json(resp).await["trips"], serde_json::json!([]));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_save_without_user_is_400() {
        let resp = send(
            state(lazy_pool(), None),
            "POST",
            "/api/v1/trip/save",
            Some(save_body("  ", serde_json::json!([]))),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_requires_user_id() {
        let resp = send(state(lazy_pool(), None), "GET", "/api/v1/trip/list", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("user_id"));
    }

    #[tokio::test]
    async fn test_unknown_trip_is_404() {
        let (pool, db_name) = create_test_db().await;
        let st = state(pool.clone(), None);

        let random_id = uuid::Uuid::new_v4();
        let resp = send(st.clone(), "GET", &format!("/api/v1/trip/{random_id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(st, "DELETE", &format!("/api/v1/trip/{random_id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_malformed_trip_id_is_400() {
        let resp = send(state(lazy_pool(), None), "GET", "/api/v1/trip/not-a-uuid", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await.get("error").is_some());
    }
}
