//! The `App` coordinator — owns the canonical dossier and every
//! collaborator, and reacts to authentication events. Components never reach
//! for ambient state; whatever they need is passed in from here.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::archive::{ArchiveFlow, GenerateOutcome};
use crate::auth::{self, AuthClient};
use crate::config::Config;
use crate::dossier::form::{DossierForm, FieldValues};
use crate::dossier::merge;
use crate::errors::AppError;
use crate::generation::preview::PreviewSurface;
use crate::generation::{DocumentGenerator, DocumentKind, HttpGenerator, Language};
use crate::models::application::ApplicationRow;
use crate::models::auth::{AuthEvent, AuthSession};
use crate::models::dossier::Dossier;
use crate::prefs::{Prefs, Theme};
use crate::remote::rest::RestStorage;
use crate::store::{LocalStore, DOSSIER_SLOT};
use crate::sync::ProfileSync;
use crate::ui::UserPrompt;

pub struct App {
    config: Config,
    store: LocalStore,
    auth_client: AuthClient,
    prompt: Arc<dyn UserPrompt>,
    preview: Arc<dyn PreviewSurface>,
    dossier: Dossier,
    session: Option<AuthSession>,
    sync: ProfileSync,
    archive: ArchiveFlow,
}

impl App {
    pub fn new(
        config: Config,
        prompt: Arc<dyn UserPrompt>,
        preview: Arc<dyn PreviewSurface>,
    ) -> Result<Self, AppError> {
        let store = LocalStore::open(&config.data_dir)?;
        let dossier = merge::initialize(&store)?;
        let auth_client = AuthClient::new(&config.storage_url, &config.storage_anon_key);

        let storage = Self::storage(&config, None);
        let generator: Arc<dyn DocumentGenerator> =
            Arc::new(HttpGenerator::new(&config.generator_url));

        Ok(App {
            sync: ProfileSync::new(storage.clone()),
            archive: ArchiveFlow::new(storage, generator),
            config,
            store,
            auth_client,
            prompt,
            preview,
            dossier,
            session: None,
        })
    }

    fn storage(config: &Config, access_token: Option<&str>) -> Arc<RestStorage> {
        Arc::new(RestStorage::new(
            &config.storage_url,
            &config.storage_anon_key,
            access_token,
        ))
    }

    pub fn dossier(&self) -> &Dossier {
        &self.dossier
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    /// Restores a persisted session, if one exists, and pulls the remote
    /// dossier for it.
    pub async fn restore_session(&mut self) -> Result<(), AppError> {
        if let Some(session) = auth::load_session(&self.store)? {
            info!("Restoring session for {}", session.email);
            self.handle_auth_event(AuthEvent::SessionRestored(session))
                .await?;
        }
        Ok(())
    }

    /// Provider-delegated sign-in entry point: the URL the user visits to
    /// authenticate.
    pub fn authorize_url(&self, provider: &str) -> String {
        self.auth_client
            .authorize_url(provider, &self.config.generator_url)
    }

    /// Completes sign-in with the access token the provider handed back.
    pub async fn sign_in_with_token(&mut self, access_token: &str) -> Result<(), AppError> {
        let user = self.auth_client.fetch_user(access_token).await?;
        let session = AuthSession {
            user_id: user.id,
            email: user.email,
            access_token: access_token.to_string(),
        };
        auth::save_session(&self.store, &session)?;
        self.handle_auth_event(AuthEvent::SignedIn(session)).await
    }

    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        self.handle_auth_event(AuthEvent::SignedOut).await
    }

    pub async fn handle_auth_event(&mut self, event: AuthEvent) -> Result<(), AppError> {
        match event {
            AuthEvent::SignedIn(session) | AuthEvent::SessionRestored(session) => {
                info!("Signed in as {}", session.email);
                let storage = Self::storage(&self.config, Some(&session.access_token));
                self.sync = ProfileSync::new(storage.clone());
                self.archive.set_applications(storage);
                self.session = Some(session);

                // Best-effort: a failed pull leaves the local dossier standing.
                match self
                    .sync
                    .pull(self.session.as_ref(), &mut self.dossier, &self.store)
                    .await
                {
                    Ok(outcome) => debug!("Profile pull outcome: {outcome:?}"),
                    Err(e) => warn!("Profile pull failed: {e}"),
                }
            }
            AuthEvent::SignedOut => {
                info!("Signing out");
                self.store.clear(DOSSIER_SLOT)?;
                auth::clear_session(&self.store)?;
                self.session = None;

                let storage = Self::storage(&self.config, None);
                self.sync = ProfileSync::new(storage.clone());
                self.archive.set_applications(storage);
                self.archive.reset_session();

                // Fresh start, as if the application had just been loaded.
                self.dossier = merge::initialize(&self.store)?;
            }
        }
        Ok(())
    }

    /// Saves an edit session: sync + prune, persist locally, mirror remotely
    /// when signed in, confirm to the user. The editor is closed by the
    /// caller once this returns.
    pub async fn save_dossier(
        &mut self,
        form: &mut DossierForm,
        values: &FieldValues,
    ) -> Result<(), AppError> {
        self.dossier = form.save(values);
        self.store.write_json(DOSSIER_SLOT, &self.dossier)?;

        match self.sync.push(self.session.as_ref(), &self.dossier).await {
            Ok(outcome) => debug!("Profile push outcome: {outcome:?}"),
            Err(e) => warn!("Profile push failed: {e}"),
        }

        self.prompt.notify("Sačuvano!");
        Ok(())
    }

    pub async fn generate(
        &mut self,
        raw_job_text: &str,
        kind: DocumentKind,
        lang: Language,
    ) -> Result<GenerateOutcome, AppError> {
        self.archive
            .generate(
                self.session.as_ref(),
                &self.dossier,
                raw_job_text,
                kind,
                lang,
                self.prompt.as_ref(),
                self.preview.as_ref(),
            )
            .await
    }

    pub async fn rebuild_from_archive(
        &self,
        id: Uuid,
        kind: DocumentKind,
        lang: Language,
    ) -> Result<GenerateOutcome, AppError> {
        self.archive
            .rebuild_from_archive(id, kind, lang, self.prompt.as_ref(), self.preview.as_ref())
            .await
    }

    pub async fn list_applications(&self) -> Result<Vec<ApplicationRow>, AppError> {
        self.archive.list_applications(self.session.as_ref()).await
    }

    pub async fn delete_application(&mut self, id: Uuid) -> Result<bool, AppError> {
        self.archive
            .delete_application(id, self.prompt.as_ref())
            .await
    }

    pub fn toggle_theme(&self) -> Result<Theme, AppError> {
        let mut prefs = Prefs::load(&self.store)?;
        let theme = prefs.toggle_theme();
        prefs.save(&self.store)?;
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::preview::GeneratedDocument;
    use crate::store::SESSION_SLOT;

    struct SilentPrompt;

    impl UserPrompt for SilentPrompt {
        fn notify(&self, _message: &str) {}
        fn confirm(&self, _message: &str) -> bool {
            false
        }
        fn prompt(&self, _message: &str, _suggestion: &str) -> Option<String> {
            None
        }
    }

    struct NullPreview;

    impl PreviewSurface for NullPreview {
        fn present(&self, _document: &GeneratedDocument) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn test_app(dir: &std::path::Path) -> App {
        let config = Config {
            storage_url: "https://ref.example.co".to_string(),
            storage_anon_key: "anon-key".to_string(),
            generator_url: "http://127.0.0.1:8000".to_string(),
            data_dir: dir.to_path_buf(),
            output_dir: dir.join("out"),
            rust_log: "info".to_string(),
        };
        App::new(config, Arc::new(SilentPrompt), Arc::new(NullPreview)).unwrap()
    }

    #[tokio::test]
    async fn test_new_app_starts_with_merged_dossier() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        assert_eq!(app.dossier(), &Dossier::template());
        assert!(app.session().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_slots_and_resets_dossier() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());

        // Simulate an earlier edit and a persisted session.
        let mut edited = Dossier::template();
        edited.full_name = "Ana Anić".to_string();
        app.store.write_json(DOSSIER_SLOT, &edited).unwrap();
        app.store
            .write_json(
                SESSION_SLOT,
                &AuthSession {
                    user_id: Uuid::new_v4(),
                    email: "ana@example.com".to_string(),
                    access_token: "token".to_string(),
                },
            )
            .unwrap();

        app.sign_out().await.unwrap();

        assert!(app.session().is_none());
        assert!(app.store.read(SESSION_SLOT).unwrap().is_none());
        assert_eq!(app.dossier(), &Dossier::template());
        assert!(app.archive.session().last_job_description.is_none());
    }

    #[tokio::test]
    async fn test_restore_without_persisted_session_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.restore_session().await.unwrap();
        assert!(app.session().is_none());
    }
}
