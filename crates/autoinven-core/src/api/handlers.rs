//! API handlers for the HTTP REST API

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{debug, error};

use crate::alerting::AlertService;
use crate::db::InventoryRepository;
use crate::models::{AlertCheck, AlertKind, AlertStatus, Bill, DashboardSummary};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Store queries
    pub inventory: InventoryRepository,
    /// Alert checks fired by page views
    pub alerts: AlertService,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List bills; viewing the list fires the pending-bills check
pub async fn list_bills(
    State(state): State<AppState>,
) -> Result<Json<Vec<Bill>>, (StatusCode, String)> {
    spawn_checks(&state.alerts, &[AlertKind::PendingBills]);

    let bills = state.inventory.list_bills().await.map_err(internal_error)?;
    Ok(Json(bills))
}

/// Dashboard summary; viewing it fires both checks
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, (StatusCode, String)> {
    spawn_checks(&state.alerts, &AlertKind::ALL);

    let summary = state
        .inventory
        .dashboard_summary(state.alerts.low_stock_threshold())
        .await
        .map_err(internal_error)?;
    Ok(Json(summary))
}

/// Run every alert check now and report the outcomes
pub async fn check_alerts(State(state): State<AppState>) -> Json<Vec<AlertCheck>> {
    Json(state.alerts.check_all().await)
}

/// Throttle status of every alert kind
pub async fn alert_status(State(state): State<AppState>) -> Json<Vec<AlertStatus>> {
    Json(state.alerts.status())
}

// Checks fired by page views run detached from the request and skip any
// kind whose check is still in flight.
fn spawn_checks(alerts: &AlertService, kinds: &'static [AlertKind]) {
    let alerts = alerts.clone();
    tokio::spawn(async move {
        for &kind in kinds {
            let result = alerts.try_check(kind).await;
            debug!(kind = %kind, result = %result, "Page view alert check");
        }
    });
}

fn internal_error(e: crate::error::Error) -> (StatusCode, String) {
    error!(error = %e, "Request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rstest::rstest;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::alerting::{
        AlertDispatcher, AlertSource, DispatcherSettings, NotificationError,
        NotificationTransport, SystemClock,
    };
    use crate::api::create_router;
    use crate::db::PostgresPool;
    use crate::models::{AlertCondition, AlertRecord, NotificationPayload, Predicate};

    struct StaticSource;

    #[async_trait]
    impl AlertSource for StaticSource {
        async fn query(
            &self,
            condition: &AlertCondition,
        ) -> crate::error::Result<Vec<AlertRecord>> {
            Ok(match condition.predicate {
                Predicate::Unpaid => vec![AlertRecord::PendingBill {
                    institution_name: "Water Board".to_string(),
                    description: "Quarterly".to_string(),
                    amount: 120.0,
                }],
                Predicate::QuantityBelow { .. } => vec![],
            })
        }
    }

    #[derive(Default)]
    struct CountingTransport {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl NotificationTransport for CountingTransport {
        async fn send(&self, _payload: &NotificationPayload) -> Result<(), NotificationError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn app(transport: Arc<CountingTransport>) -> axum::Router {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy("postgres://autoinven@127.0.0.1:1/autoinven")
            .unwrap();
        let dispatcher = AlertDispatcher::new(
            Arc::new(StaticSource),
            transport,
            DispatcherSettings::new("owner@example.com"),
        );
        let state = AppState {
            inventory: InventoryRepository::new(&PostgresPool::from_pool(pool)),
            alerts: AlertService::new(dispatcher, Arc::new(SystemClock), 15),
        };
        create_router(state)
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn wait_for_sends(transport: &CountingTransport, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while transport.sent.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("page view should fire the pending bills check");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_check_reports_each_kind() {
        let transport = Arc::new(CountingTransport::default());
        let response = app(transport.clone())
            .oneshot(
                Request::post("/api/v1/alerts/check")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body[0]["kind"], "pending_bills");
        assert_eq!(body[0]["result"]["status"], "sent");
        assert_eq!(body[0]["result"]["record_count"], 1);
        assert_eq!(body[1]["kind"], "low_stock");
        assert_eq!(body[1]["result"]["status"], "skipped");
        assert_eq!(body[1]["result"]["reason"], "no_matching_records");
        assert_eq!(transport.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_after_check() {
        let router = app(Arc::default());

        let response = router
            .clone()
            .oneshot(Request::post("/api/v1/alerts/check").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::get("/api/v1/alerts/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json(response).await;

        assert_eq!(body[0]["kind"], "pending_bills");
        assert_eq!(body[0]["cooling_down"], true);
        assert!(body[0]["last_sent_at"].is_string());
        assert_eq!(body[1]["cooling_down"], false);
        assert!(body[1]["last_sent_at"].is_null());
    }

    #[rstest]
    #[case::bills("/api/v1/bills")]
    #[case::dashboard("/api/v1/dashboard")]
    #[tokio::test]
    async fn test_page_view_fires_checks_even_when_store_fails(#[case] path: &str) {
        let transport = Arc::new(CountingTransport::default());
        let response = app(transport.clone())
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        wait_for_sends(&transport, 1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.sent.load(Ordering::SeqCst), 1);
    }
}
