//! Authentication plumbing. Identity lives with the hosted provider; this
//! module only delegates sign-in, resolves an access token to a user, and
//! persists the session locally so it can be restored on the next run.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::auth::AuthSession;
use crate::store::{LocalStore, SESSION_SLOT};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The user record returned by the auth endpoint for a valid access token.
#[derive(Debug, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: String,
}

#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        AuthClient {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Provider-delegated sign-in: the user visits this URL, authenticates
    /// with the identity provider and comes back with an access token.
    pub fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "{}/auth/v1/authorize?provider={provider}&redirect_to={redirect_to}",
            self.base_url
        )
    }

    /// Resolves an access token to the user it belongs to.
    pub async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

/// Loads the persisted session, if any. A malformed session slot is cleared
/// and treated as signed out.
pub fn load_session(store: &LocalStore) -> Result<Option<AuthSession>, AppError> {
    match store.read_json::<AuthSession>(SESSION_SLOT) {
        Ok(session) => Ok(session),
        Err(AppError::MalformedData(e)) => {
            warn!("Malformed session slot, clearing it: {e}");
            store.clear(SESSION_SLOT)?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub fn save_session(store: &LocalStore, session: &AuthSession) -> Result<(), AppError> {
    store.write_json(SESSION_SLOT, session)?;
    debug!("Session persisted for {}", session.user_id);
    Ok(())
}

pub fn clear_session(store: &LocalStore) -> Result<(), AppError> {
    store.clear(SESSION_SLOT)
}
