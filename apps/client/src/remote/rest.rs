//! REST implementation of the repositories against the hosted storage
//! (PostgREST-style table endpoints). Every request carries the service
//! `apikey` header plus a bearer token — the session's access token when one
//! exists, the anonymous key otherwise.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, NewApplication};
use crate::models::dossier::Dossier;
use crate::remote::{ApplicationRepository, ProfileRepository};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct RestStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl RestStorage {
    pub fn new(base_url: &str, api_key: &str, access_token: Option<&str>) -> Self {
        RestStorage {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bearer: access_token.unwrap_or(api_key).to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    /// Maps a non-success status to `AppError::Api` with the response body as
    /// the message.
    async fn check(response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    cv_data: Option<Dossier>,
}

#[async_trait]
impl ProfileRepository for RestStorage {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<Dossier>, AppError> {
        let url = format!(
            "{}?select=cv_data&id=eq.{user_id}",
            self.table_url("profiles")
        );
        let response = Self::check(self.with_auth(self.client.get(&url)).send().await?).await?;
        let rows: Vec<ProfileRow> = response.json().await?;
        debug!("Fetched profile for {user_id}: present={}", !rows.is_empty());
        Ok(rows.into_iter().next().and_then(|row| row.cv_data))
    }

    async fn upsert(&self, user_id: Uuid, dossier: &Dossier) -> Result<(), AppError> {
        let body = json!([{ "id": user_id, "cv_data": dossier }]);
        let response = self
            .with_auth(self.client.post(self.table_url("profiles")))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Upserted profile for {user_id}");
        Ok(())
    }
}

#[async_trait]
impl ApplicationRepository for RestStorage {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ApplicationRow>, AppError> {
        let url = format!(
            "{}?select=*&user_id=eq.{user_id}&order=created_at.desc",
            self.table_url("applications")
        );
        let response = Self::check(self.with_auth(self.client.get(&url)).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn fetch(&self, id: Uuid) -> Result<ApplicationRow, AppError> {
        let url = format!("{}?select=*&id=eq.{id}", self.table_url("applications"));
        let response = Self::check(self.with_auth(self.client.get(&url)).send().await?).await?;
        let rows: Vec<ApplicationRow> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
    }

    async fn insert(&self, new: NewApplication) -> Result<ApplicationRow, AppError> {
        let response = self
            .with_auth(self.client.post(self.table_url("applications")))
            .header("Prefer", "return=representation")
            .json(&json!([new]))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let rows: Vec<ApplicationRow> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Insert returned no representation").into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let url = format!("{}?id=eq.{id}", self.table_url("applications"));
        Self::check(self.with_auth(self.client.delete(&url)).send().await?).await?;
        debug!("Deleted application {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let storage = RestStorage::new("https://ref.example.co/", "anon-key", None);
        assert_eq!(
            storage.table_url("profiles"),
            "https://ref.example.co/rest/v1/profiles"
        );
    }

    #[test]
    fn test_bearer_falls_back_to_api_key() {
        let anon = RestStorage::new("https://ref.example.co", "anon-key", None);
        assert_eq!(anon.bearer, "anon-key");

        let authed = RestStorage::new("https://ref.example.co", "anon-key", Some("token"));
        assert_eq!(authed.bearer, "token");
    }

    #[test]
    fn test_profile_row_tolerates_null_cv_data() {
        let row: ProfileRow = serde_json::from_str(r#"{"cv_data": null}"#).unwrap();
        assert!(row.cv_data.is_none());
    }
}
