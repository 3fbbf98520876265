use api_types::{
    ErrorResponse,
    expense::{
        BulkDelete, BulkUpdate, ConflictResponse, Expense, ExpenseNew, ExpenseUpdate, FieldUpdate,
    },
    reference::{Category, PaymentMethod},
};
use chrono::{DateTime, Utc};
use engine::{ExpenseFilter, ExpenseService, ServiceError, ServiceResult};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

mod backend;

pub use backend::Backend;

/// [`ExpenseService`] over the REST API of the server crate.
#[derive(Debug, Clone)]
pub struct HttpService {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpService {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::Terminal(format!("invalid base_url: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> ServiceResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::Unavailable(format!("invalid base_url: {err}")))
    }
}

fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::Unavailable(err.to_string())
}

/// Maps a non-success reply onto the service error taxonomy.
async fn error_from_response(res: Response) -> ServiceError {
    let status = res.status();
    let body = match res.bytes().await {
        Ok(body) => body,
        Err(err) => return transport(err),
    };

    if status == StatusCode::CONFLICT {
        if let Ok(conflict) = serde_json::from_slice::<ConflictResponse>(&body) {
            return ServiceError::Conflict(Box::new(conflict.current));
        }
    }

    let message = serde_json::from_slice::<ErrorResponse>(&body)
        .map(|err| err.error)
        .unwrap_or_else(|_| format!("unexpected status {status}"));

    match status.as_u16() {
        404 => ServiceError::NotFound(message),
        400 | 409 | 422 => ServiceError::Validation(message),
        _ => ServiceError::Unavailable(message),
    }
}

async fn read_json<T: DeserializeOwned>(res: Response) -> ServiceResult<T> {
    if res.status().is_success() {
        return res.json::<T>().await.map_err(transport);
    }
    Err(error_from_response(res).await)
}

async fn read_empty(res: Response) -> ServiceResult<()> {
    if res.status().is_success() {
        return Ok(());
    }
    Err(error_from_response(res).await)
}

impl ExpenseService for HttpService {
    async fn list(&self, filter: &ExpenseFilter) -> ServiceResult<Vec<Expense>> {
        let res = self
            .http
            .get(self.endpoint("expenses")?)
            .query(&filter.to_query())
            .send()
            .await
            .map_err(transport)?;
        read_json(res).await
    }

    async fn get(&self, id: i64) -> ServiceResult<Expense> {
        let res = self
            .http
            .get(self.endpoint(&format!("expenses/{id}"))?)
            .send()
            .await
            .map_err(transport)?;
        read_json(res).await
    }

    async fn update(
        &self,
        id: i64,
        changes: &[FieldUpdate],
        expected_modified_at: Option<DateTime<Utc>>,
    ) -> ServiceResult<Expense> {
        let payload = ExpenseUpdate {
            changes: changes.to_vec(),
            expected_modified_at,
        };
        let res = self
            .http
            .patch(self.endpoint(&format!("expenses/{id}"))?)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        read_json(res).await
    }

    async fn create(&self, expense: &ExpenseNew) -> ServiceResult<Expense> {
        let res = self
            .http
            .post(self.endpoint("expenses")?)
            .json(expense)
            .send()
            .await
            .map_err(transport)?;
        read_json(res).await
    }

    async fn delete(&self, id: i64) -> ServiceResult<()> {
        let res = self
            .http
            .delete(self.endpoint(&format!("expenses/{id}"))?)
            .send()
            .await
            .map_err(transport)?;
        read_empty(res).await
    }

    async fn bulk_update(&self, ids: &[i64], changes: &[FieldUpdate]) -> ServiceResult<()> {
        let payload = BulkUpdate {
            ids: ids.to_vec(),
            changes: changes.to_vec(),
        };
        let res = self
            .http
            .post(self.endpoint("expenses/bulk/update")?)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        read_empty(res).await
    }

    async fn bulk_delete(&self, ids: &[i64]) -> ServiceResult<()> {
        let payload = BulkDelete { ids: ids.to_vec() };
        let res = self
            .http
            .post(self.endpoint("expenses/bulk/delete")?)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        read_empty(res).await
    }

    async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        let res = self
            .http
            .get(self.endpoint("categories")?)
            .send()
            .await
            .map_err(transport)?;
        read_json(res).await
    }

    async fn list_payment_methods(&self) -> ServiceResult<Vec<PaymentMethod>> {
        let res = self
            .http
            .get(self.endpoint("payment-methods")?)
            .send()
            .await
            .map_err(transport)?;
        read_json(res).await
    }
}

#[cfg(test)]
mod tests {
    use api_types::expense::FieldValue;
    use engine::{Editor, MemoryService, Period};

    use super::*;

    async fn spawn_server() -> (HttpService, MemoryService) {
        let store = MemoryService::seeded();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = server::spawn_with_listener(store.clone(), listener).unwrap();
        let service = HttpService::new(&format!("http://{addr}")).unwrap();
        (service, store)
    }

    fn january() -> ExpenseFilter {
        ExpenseFilter::for_period("2026-01".parse::<Period>().unwrap())
    }

    #[test]
    fn rejects_malformed_base_url() {
        assert!(HttpService::new("not a url").is_err());
    }

    #[tokio::test]
    async fn lists_reference_data_and_expenses() {
        let (service, _) = spawn_server().await;

        let methods = service.list_payment_methods().await.unwrap();
        assert_eq!(methods[0].name, "Discover");
        assert!(!service.list_categories().await.unwrap().is_empty());

        let expenses = service.list(&january()).await.unwrap();
        assert_eq!(expenses.len(), 13);
    }

    #[tokio::test]
    async fn stale_update_carries_the_current_record() {
        let (service, store) = spawn_server().await;
        let original = service.get(4).await.unwrap();
        let theirs = store
            .simulate_concurrent_edit(4, &[FieldUpdate::Set(FieldValue::Amount(5000))])
            .await
            .unwrap();

        let err = service
            .update(
                4,
                &[FieldUpdate::Set(FieldValue::Amount(-4500))],
                original.modified_at,
            )
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Conflict(Box::new(theirs)));
    }

    #[tokio::test]
    async fn missing_and_invalid_requests_map_to_service_errors() {
        let (service, _) = spawn_server().await;

        let err = service.delete(999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = service.bulk_delete(&[]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = HttpService::new(&format!("http://{addr}")).unwrap();
        let err = service.list(&january()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn editor_saves_through_the_api() {
        let (service, store) = spawn_server().await;
        let mut editor = Editor::builder(service).filter(january()).build();
        editor.load_reference().await.unwrap();
        editor.load();
        editor.settle().await;

        editor.edit_amount(4, "45-").unwrap();
        editor.settle().await;

        assert_eq!(store.peek(4).await.unwrap().amount_minor, -4500);
        assert!(editor.page_error().is_none());
    }
}
