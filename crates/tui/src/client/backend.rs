use api_types::{
    expense::{Expense, ExpenseNew, FieldUpdate},
    reference::{Category, PaymentMethod},
};
use chrono::{DateTime, Utc};
use engine::{ExpenseFilter, ExpenseService, MemoryService, ServiceResult};

use super::HttpService;
use crate::{
    config::{AppConfig, Source},
    error::Result,
};

/// The service picked by the `source` setting.
#[derive(Clone)]
pub enum Backend {
    Memory(MemoryService),
    Http(HttpService),
}

impl Backend {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(match config.source {
            Source::Memory => Self::Memory(MemoryService::seeded()),
            Source::Http => Self::Http(HttpService::new(&config.base_url)?),
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory(_) => "sample data",
            Self::Http(_) => "api",
        }
    }
}

impl ExpenseService for Backend {
    async fn list(&self, filter: &ExpenseFilter) -> ServiceResult<Vec<Expense>> {
        match self {
            Self::Memory(service) => service.list(filter).await,
            Self::Http(service) => service.list(filter).await,
        }
    }

    async fn get(&self, id: i64) -> ServiceResult<Expense> {
        match self {
            Self::Memory(service) => service.get(id).await,
            Self::Http(service) => service.get(id).await,
        }
    }

    async fn update(
        &self,
        id: i64,
        changes: &[FieldUpdate],
        expected_modified_at: Option<DateTime<Utc>>,
    ) -> ServiceResult<Expense> {
        match self {
            Self::Memory(service) => service.update(id, changes, expected_modified_at).await,
            Self::Http(service) => service.update(id, changes, expected_modified_at).await,
        }
    }

    async fn create(&self, expense: &ExpenseNew) -> ServiceResult<Expense> {
        match self {
            Self::Memory(service) => service.create(expense).await,
            Self::Http(service) => service.create(expense).await,
        }
    }

    async fn delete(&self, id: i64) -> ServiceResult<()> {
        match self {
            Self::Memory(service) => service.delete(id).await,
            Self::Http(service) => service.delete(id).await,
        }
    }

    async fn bulk_update(&self, ids: &[i64], changes: &[FieldUpdate]) -> ServiceResult<()> {
        match self {
            Self::Memory(service) => service.bulk_update(ids, changes).await,
            Self::Http(service) => service.bulk_update(ids, changes).await,
        }
    }

    async fn bulk_delete(&self, ids: &[i64]) -> ServiceResult<()> {
        match self {
            Self::Memory(service) => service.bulk_delete(ids).await,
            Self::Http(service) => service.bulk_delete(ids).await,
        }
    }

    async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        match self {
            Self::Memory(service) => service.list_categories().await,
            Self::Http(service) => service.list_categories().await,
        }
    }

    async fn list_payment_methods(&self) -> ServiceResult<Vec<PaymentMethod>> {
        match self {
            Self::Memory(service) => service.list_payment_methods().await,
            Self::Http(service) => service.list_payment_methods().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_source_serves_sample_data() {
        let config = AppConfig {
            source: Source::Memory,
            ..Default::default()
        };
        let backend = Backend::from_config(&config).unwrap();
        assert_eq!(backend.label(), "sample data");
        assert_eq!(backend.list_payment_methods().await.unwrap().len(), 8);
    }
}
