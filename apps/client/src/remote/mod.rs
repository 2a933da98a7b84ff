//! Narrow repository interface over the hosted storage. The workflow logic
//! only ever sees these traits, so it runs against in-memory fakes in tests
//! without any real network dependency.

pub mod rest;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, NewApplication};
use crate::models::dossier::Dossier;

/// One remote profile record per user identity, holding the serialized
/// dossier.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetches the dossier stored for `user_id`, if any.
    async fn fetch(&self, user_id: Uuid) -> Result<Option<Dossier>, AppError>;

    /// Inserts or overwrites the record keyed by `user_id`.
    async fn upsert(&self, user_id: Uuid, dossier: &Dossier) -> Result<(), AppError>;
}

/// Archived job applications, owner-scoped.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// All records owned by `user_id`, newest creation time first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ApplicationRow>, AppError>;

    async fn fetch(&self, id: Uuid) -> Result<ApplicationRow, AppError>;

    /// Inserts a record; the storage assigns `id` and `created_at`.
    async fn insert(&self, new: NewApplication) -> Result<ApplicationRow, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
