//! Sync endpoint routes.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use buendia_engine::{EntityKind, SyncResponse, Timestamp};
use chrono::Utc;

use crate::db::PgRecordSource;
use crate::error::{AppError, Result};
use crate::handlers::{handle_sync, SyncItem, SyncQuery};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/{kind}", get(sync_handler))
}

fn request_time() -> Result<Timestamp> {
    let now = Utc::now().timestamp_millis();
    Timestamp::try_from(now).map_err(|_| AppError::Internal(format!("clock reads {now} ms")))
}

/// GET /{kind} - One page of patients, observations or orders.
async fn sync_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<SyncResponse<SyncItem>>> {
    let kind: EntityKind = kind
        .parse()
        .map_err(|_| AppError::NotFound(format!("No such entity kind \"{kind}\"")))?;
    let source = PgRecordSource::new(state.pool.clone());

    let response = handle_sync(
        &source,
        kind,
        query,
        state.config.max_page_size,
        request_time()?,
    )
    .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::{routes, AppState};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// A router whose pool never connects; only paths that fail before any
    /// query can be exercised.
    fn app() -> axum::Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://buendia@localhost/buendia_test")
            .unwrap();
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: String::new(),
            max_page_size: 50,
        };
        routes::create_routes().with_state(AppState {
            pool,
            config: Arc::new(config),
        })
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn unknown_kind_is_not_found() {
        let (status, body) = get("/encounters").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], r#"No such entity kind "encounters""#);
    }

    #[tokio::test]
    async fn negative_limit_is_bad_request() {
        let (status, _) = get("/patients?limit=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_since_is_bad_request() {
        let (status, body) = get("/observations?since=yesterday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], r#"Invalid bookmark "yesterday""#);
    }

    #[test]
    fn request_time_reads_the_wall_clock() {
        // 2015-11-25T11:25:28Z, well before any clock this runs on.
        assert!(super::request_time().unwrap() > 1_448_450_728_000);
    }

    #[tokio::test]
    async fn health_reports_page_size() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["maxPageSize"], 50);
        assert_eq!(body["bufferWindowMs"], 2000);
        assert_eq!(
            body["kinds"],
            serde_json::json!(["patients", "observations", "orders"])
        );
    }
}
