//! Pool monitor API — serves the latest pool fetch round and block lookups
//! from the snapshot store filled by the pool scraper.

mod params;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use poolwatch_core::{AppError, Settings, telemetry};
use poolwatch_fleet::{self as fleet, BlockLookup, StatsReport};
use poolwatch_storage::{PgStore, SnapshotStore};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc, time::Duration};

/// Shared application state.
struct AppState {
    store: Box<dyn SnapshotStore>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    telemetry::init();
    let settings = Settings::from_env()?;

    tracing::info!("Starting pool monitor API");

    // The store connects on first request, so the API can come up before
    // the database does.
    let store = PgStore::connect_lazy(
        &settings.database_url,
        settings.db_max_idle,
        Duration::from_secs(settings.db_connect_timeout_secs),
    )?;

    let state = Arc::new(AppState {
        store: Box::new(store),
    });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.api_port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped.");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/find", get(find_query).post(find_form))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down gracefully…");
}

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    initializing: bool,
}

/// [`AppError`] rendered as an HTTP response.
struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            AppError::NoRecentFetch => (StatusCode::SERVICE_UNAVAILABLE, "no_recent_fetch"),
            AppError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::NotFound => return (StatusCode::NOT_FOUND, "Not Found").into_response(),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        let initializing = matches!(self.0, AppError::NoRecentFetch);

        if status.is_server_error() && !initializing {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: code,
            message: self.0.to_string(),
            initializing,
        };
        (status, Json(body)).into_response()
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> ApiError {
    AppError::NotFound.into()
}

/// GET /stats — latest fetch round, classified pools and hashrate chart.
async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsReport>, ApiError> {
    let report = fleet::stats(state.store.as_ref()).await?;
    Ok(Json(report))
}

/// GET /find?block=… — hashes in the query string.
async fn find_query(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<BlockLookup>, ApiError> {
    let hashes = params::requested_blocks(query.as_deref().unwrap_or_default().as_bytes())?;
    find(&state, &hashes).await
}

/// POST /find — hashes in a form-encoded body.
async fn find_form(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<BlockLookup>, ApiError> {
    let hashes = params::requested_blocks(&body)?;
    find(&state, &hashes).await
}

async fn find(state: &AppState, hashes: &[String]) -> Result<Json<BlockLookup>, ApiError> {
    let lookup = fleet::find(state.store.as_ref(), hashes).await?;
    Ok(Json(lookup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use poolwatch_storage::models::{BlockRecord, FetchRound, HourlySample, PoolRecord, Snapshot};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Default)]
    struct FixedStore {
        snapshot: Option<Snapshot>,
        blocks: Vec<BlockRecord>,
        queries: Arc<AtomicUsize>,
        down: bool,
    }

    #[async_trait::async_trait]
    impl SnapshotStore for FixedStore {
        async fn latest_snapshot(&self) -> Result<Option<Snapshot>, AppError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.down {
                return Err(AppError::StoreUnavailable("connection refused".into()));
            }
            Ok(self.snapshot.clone())
        }

        async fn blocks_by_hash(&self, hashes: &[String]) -> Result<Vec<BlockRecord>, AppError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .blocks
                .iter()
                .filter(|b| hashes.contains(&b.hash))
                .cloned()
                .collect())
        }
    }

    fn pool(id: i64, height: Option<i64>, hashrate: Option<f64>) -> PoolRecord {
        PoolRecord {
            id,
            name: format!("pool-{id}"),
            url: format!("https://pool{id}.example"),
            blocks_url: None,
            location: Some("EU".into()),
            height,
            blocks_found: None,
            hashrate,
            effort: None,
            miners: None,
            miners_paid: None,
            payments: None,
            fee: None,
            threshold: None,
            error: None,
            hr1: None,
            hr7: None,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            round: FetchRound {
                id: 7,
                time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                height: 500,
            },
            pools: vec![pool(1, Some(500), Some(2_000.0)), pool(2, Some(520), Some(1_000.0))],
            samples: vec![HourlySample {
                pool: 2,
                hour: Utc.timestamp_opt(1_699_999_200, 0).unwrap(),
                hashrate: Some(1_500.0),
            }],
        }
    }

    fn found(hash: &str) -> BlockRecord {
        BlockRecord {
            hash: hash.into(),
            pool: 1,
            name: "pool-1".into(),
            blocks_url: Some("https://pool1.example/blocks".into()),
            height: 480,
        }
    }

    async fn send(store: FixedStore, request: Request<Body>) -> (StatusCode, String) {
        let app = router(Arc::new(AppState {
            store: Box::new(store),
        }));
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json(body: &str) -> serde_json::Value {
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn unknown_path_is_plain_404() {
        let (status, body) = send(FixedStore::default(), get("/pools")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn stats_before_first_fetch() {
        let (status, body) = send(FixedStore::default(), get("/stats")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let body = json(&body);
        assert_eq!(body["error"], "no_recent_fetch");
        assert_eq!(body["initializing"], true);
        assert!(body.get("pools").is_none());
    }

    #[tokio::test]
    async fn stats_with_store_down() {
        let store = FixedStore {
            down: true,
            ..Default::default()
        };
        let (status, body) = send(store, get("/stats")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json(&body)["error"], "store_unavailable");
        assert!(json(&body).get("initializing").is_none());
    }

    #[tokio::test]
    async fn stats_report() {
        let store = FixedStore {
            snapshot: Some(snapshot()),
            ..Default::default()
        };
        let (status, body) = send(store, get("/stats")).await;
        assert_eq!(status, StatusCode::OK);

        let body = json(&body);
        assert_eq!(body["time"], 1_700_000_000.0);
        assert_eq!(body["height"], 500);
        assert_eq!(body["hashrate_synced"], 2_000.0);
        assert_eq!(body["hashrate_desynced"], 1_000.0);
        assert_eq!(body["pools"][0]["desync"], false);
        assert_eq!(body["pools"][1]["desync"], true);
        assert_eq!(
            body["hr_chart"],
            serde_json::json!([{ "hour": 1_699_999_200, "kh": [null, 1.5] }])
        );
    }

    #[tokio::test]
    async fn find_by_query_string() {
        let store = FixedStore {
            blocks: vec![found("A")],
            ..Default::default()
        };
        let (status, body) = send(store, get("/find?block=A&block=B")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json(&body),
            serde_json::json!({
                "A": {
                    "pool": "pool-1",
                    "height": 480,
                    "blocks_url": "https://pool1.example/blocks",
                },
                "B": null,
            })
        );
    }

    #[tokio::test]
    async fn find_by_form_body() {
        let store = FixedStore {
            blocks: vec![found("A")],
            ..Default::default()
        };
        let request = Request::post("/find?block=ignored")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("block%5B%5D=A&block%5B%5D=C"))
            .unwrap();

        let (status, body) = send(store, request).await;
        assert_eq!(status, StatusCode::OK);

        let body = json(&body);
        assert_eq!(body["A"]["pool"], "pool-1");
        assert_eq!(body["C"], serde_json::Value::Null);
        assert!(body.get("ignored").is_none());
    }

    #[tokio::test]
    async fn find_without_hashes_skips_store() {
        let queries = Arc::new(AtomicUsize::new(0));
        let store = FixedStore {
            queries: queries.clone(),
            ..Default::default()
        };
        let (status, body) = send(store, get("/find")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}");
        assert_eq!(queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn find_with_malformed_body() {
        let request = Request::post("/find")
            .body(Body::from(vec![b'b', b'l', 0xc3, 0x28]))
            .unwrap();
        let (status, body) = send(FixedStore::default(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "bad_request");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = send(FixedStore::default(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
