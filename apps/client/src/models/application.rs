use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::dossier::Dossier;

/// One archived job application: the job description plus the dossier
/// snapshot it was generated from. Immutable once inserted; deleted only by
/// explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub job_description: String,
    pub cv_data: Dossier,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new archive record. `id` and `created_at` are
/// assigned by the remote storage.
#[derive(Debug, Clone, Serialize)]
pub struct NewApplication {
    pub user_id: Uuid,
    pub company_name: String,
    pub job_description: String,
    pub cv_data: Dossier,
}
