//! Storage traits consumed by the HTTP handlers.
//!
//! Handlers only see `dyn RegistryStore`; [`super::PgStore`] backs it with
//! PostgreSQL and [`crate::testing::MemoryStore`] keeps everything in memory.

use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{LookupItem, Page, Patient, PatientInput, PatientQuery, PatientSummary, UserProfile, UserRecord};

#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Newest first, filtered by `query.search` when present.
    async fn list_patients(&self, query: &PatientQuery) -> Result<Page<PatientSummary>, DatabaseError>;

    async fn find_patient(&self, id: i64) -> Result<Option<Patient>, DatabaseError>;

    /// Whether another patient already uses `numero_documento`.
    async fn document_exists(&self, numero_documento: &str, exclude_id: Option<i64>) -> Result<bool, DatabaseError>;

    /// Returns the new patient id.
    async fn create_patient(&self, input: &PatientInput) -> Result<i64, DatabaseError>;

    /// Returns `false` when no patient has `id`.
    async fn update_patient(&self, id: i64, input: &PatientInput) -> Result<bool, DatabaseError>;

    /// Returns `false` when no patient has `id`.
    async fn delete_patient(&self, id: i64) -> Result<bool, DatabaseError>;
}

/// Reference data, each list ordered by name.
#[async_trait]
pub trait LookupStore: Send + Sync {
    async fn document_types(&self) -> Result<Vec<LookupItem>, DatabaseError>;

    async fn genders(&self) -> Result<Vec<LookupItem>, DatabaseError>;

    async fn departments(&self) -> Result<Vec<LookupItem>, DatabaseError>;

    async fn municipalities(&self, departamento_id: i64) -> Result<Vec<LookupItem>, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError>;

    async fn find_user_profile(&self, id: i64) -> Result<Option<UserProfile>, DatabaseError>;
}

#[async_trait]
pub trait RegistryStore: PatientStore + LookupStore + UserStore {
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
