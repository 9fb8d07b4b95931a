//! Health check payload.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Connection pool state as seen by the health check.
#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub pool_size: u32,
    pub idle_connections: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Row counts of the three record tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub users: i64,
    pub links: i64,
    pub short_links: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub database: DatabaseHealth,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordCounts>,
}

impl HealthResponse {
    /// Status follows database reachability; counts are only known when the
    /// database answered.
    pub fn new(database: DatabaseHealth, records: Option<RecordCounts>) -> Self {
        let status = if database.reachable {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
            records,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_healthy_payload() {
        let response = HealthResponse::new(
            DatabaseHealth {
                reachable: true,
                pool_size: 3,
                idle_connections: 2,
                error: None,
            },
            Some(RecordCounts {
                users: 6,
                links: 10,
                short_links: 10,
            }),
        );

        assert!(response.is_healthy());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["database"], json!({ "reachable": true, "pool_size": 3, "idle_connections": 2 }));
        assert_eq!(value["records"]["short_links"], 10);
    }

    #[test]
    fn test_unreachable_database_is_degraded() {
        let response = HealthResponse::new(
            DatabaseHealth {
                reachable: false,
                pool_size: 0,
                idle_connections: 0,
                error: Some("connection refused".to_string()),
            },
            None,
        );

        assert!(!response.is_healthy());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "degraded");
        assert_eq!(value["database"]["error"], "connection refused");
        assert!(value.get("records").is_none());
    }
}
