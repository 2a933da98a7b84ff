use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated session. Persisted in the local session slot so the
/// session-restore trigger survives process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
}

/// External authentication triggers the workflow reacts to.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    SessionRestored(AuthSession),
    SignedOut,
}
