use api_types::{ErrorResponse, expense::ConflictResponse};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ServiceError};

pub use server::{ServerState, router, run_with_listener, spawn_with_listener};

mod expenses;
mod reference;
mod server;

pub enum ServerError {
    Service(ServiceError),
    Engine(EngineError),
    Generic(String),
}

fn status_for_service_error(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::NoConflict(_) => StatusCode::CONFLICT,
        EngineError::InvalidPeriod(_) => StatusCode::BAD_REQUEST,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidUpdate(_)
        | EngineError::EmptySelection => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServerError::Service(ServiceError::Conflict(current)) => {
                let error = format!("expense {} was modified by someone else", current.id);
                let body = ConflictResponse {
                    error,
                    current: *current,
                };
                (StatusCode::CONFLICT, Json(body)).into_response()
            }
            ServerError::Service(err) => {
                let status = status_for_service_error(&err);
                if status.is_server_error() {
                    tracing::error!("service error: {err}");
                }
                let error = err.to_string();
                (status, Json(ErrorResponse { error })).into_response()
            }
            ServerError::Engine(err) => {
                let error = err.to_string();
                (status_for_engine_error(&err), Json(ErrorResponse { error })).into_response()
            }
            ServerError::Generic(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
        }
    }
}

impl From<ServiceError> for ServerError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use api_types::expense::Expense;
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let res = ServerError::from(ServiceError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_maps_to_409() {
        let current = Expense {
            id: 4,
            date: NaiveDate::from_ymd_opt(2026, 1, 23).unwrap(),
            description: "Gas Station".to_string(),
            amount_minor: 4500,
            category_id: None,
            payment_method_id: None,
            date_paid: None,
            created_at: None,
            modified_at: None,
        };
        let res = ServerError::from(ServiceError::Conflict(Box::new(current))).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_maps_to_422() {
        let res = ServerError::from(ServiceError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn bad_period_maps_to_400() {
        let res = ServerError::from(EngineError::InvalidPeriod("2026-13".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
