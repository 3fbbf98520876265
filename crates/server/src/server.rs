use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use engine::MemoryService;

use crate::{expenses, reference};

#[derive(Clone)]
pub struct ServerState {
    pub service: MemoryService,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/expenses/{id}",
            get(expenses::get)
                .patch(expenses::update)
                .delete(expenses::delete),
        )
        .route("/expenses/bulk/update", post(expenses::bulk_update))
        .route("/expenses/bulk/delete", post(expenses::bulk_delete))
        .route("/categories", get(reference::categories))
        .route("/payment-methods", get(reference::payment_methods))
        .with_state(state)
}

pub async fn run_with_listener(
    service: MemoryService,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(ServerState { service })).await
}

pub fn spawn_with_listener(
    service: MemoryService,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(service, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use api_types::expense::{ConflictResponse, Expense, ExpenseUpdate, FieldUpdate, FieldValue};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use engine::ExpenseService;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn app() -> (Router, MemoryService) {
        let service = MemoryService::seeded();
        let app = router(ServerState {
            service: service.clone(),
        });
        (app, service)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &impl serde::Serialize) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn list_filters_by_period_and_method() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::get("/expenses?period=2026-01&payment_method=1&unpaid_only=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let expenses: Vec<Expense> = body_json(response).await;
        assert_eq!(expenses.len(), 9);
    }

    #[tokio::test]
    async fn invalid_period_is_rejected() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/expenses?period=2026-13").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stale_update_returns_current_record() {
        let (app, service) = app();
        let original = service.get(4).await.unwrap();
        let theirs = service
            .simulate_concurrent_edit(4, &[FieldUpdate::Set(FieldValue::Amount(5000))])
            .await
            .unwrap();

        let body = ExpenseUpdate {
            changes: vec![FieldUpdate::Set(FieldValue::Amount(-4500))],
            expected_modified_at: original.modified_at,
        };
        let response = app
            .oneshot(json_request("PATCH", "/expenses/4", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let conflict: ConflictResponse = body_json(response).await;
        assert_eq!(conflict.current, theirs);
    }

    #[tokio::test]
    async fn delete_missing_expense_is_404() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::delete("/expenses/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bulk_delete_without_ids_is_rejected() {
        let (app, _) = app();
        let body = serde_json::json!({ "ids": [] });
        let response = app
            .oneshot(json_request("POST", "/expenses/bulk/delete", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
