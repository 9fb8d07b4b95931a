//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{DatabaseHealth, HealthResponse, RecordCounts};
use crate::state::AppState;

const COUNT_RECORDS: &str = "SELECT \
    (SELECT COUNT(*) FROM users), \
    (SELECT COUNT(*) FROM links), \
    (SELECT COUNT(*) FROM shortlinks)";

/// Reports whether the service can reach its database.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: database reachable, with row counts
/// - **503 Service Unavailable**: database unreachable
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let pool = state.pool.as_ref();

    let counted = sqlx::query_as::<_, (i64, i64, i64)>(COUNT_RECORDS)
        .fetch_one(pool)
        .await;

    let (error, records) = match counted {
        Ok((users, links, short_links)) => (
            None,
            Some(RecordCounts {
                users,
                links,
                short_links,
            }),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {e}");
            (Some(e.to_string()), None)
        }
    };

    let response = HealthResponse::new(
        DatabaseHealth {
            reachable: error.is_none(),
            pool_size: pool.size(),
            idle_connections: pool.num_idle(),
            error,
        },
        records,
    );

    if response.is_healthy() {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
