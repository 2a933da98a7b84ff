//! Application session and archive workflow.
//!
//! One generation action walks: validate job text → solicit company name
//! (new job, signed in) → take the generation lock → request the document →
//! preview → conditionally insert the archive record → settle (lock releases
//! on every path). Whether a job is "new" is decided solely by exact string
//! equality against the last job description processed in this in-memory
//! session; the tracking is volatile and resets on restart.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::dossier::form::escape_html;
use crate::errors::AppError;
use crate::generation::preview::{GeneratedDocument, PreviewSurface};
use crate::generation::{self, DocumentGenerator, DocumentKind, Language};
use crate::models::application::{ApplicationRow, NewApplication};
use crate::models::auth::AuthSession;
use crate::models::dossier::Dossier;
use crate::remote::ApplicationRepository;
use crate::sync::InFlight;
use crate::ui::UserPrompt;

pub const UNKNOWN_COMPANY: &str = "Nepoznata Kompanija";
pub const EMPTY_ARCHIVE_MESSAGE: &str = "Nema sačuvanih aplikacija";

const COMPANY_PROMPT: &str = "Unesite ime kompanije za koju aplicirate (za arhivu):";
const COMPANY_SUGGESTION: &str = "Ime kompanije";

/// Reload-volatile tracking of the last processed job and its archive
/// record.
#[derive(Debug, Default)]
pub struct SessionState {
    pub last_job_description: Option<String>,
    pub last_application_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The document was previewed; `archived` carries the id of the archive
    /// record created for it, if one was.
    Previewed { archived: Option<Uuid> },
    /// Another generation holds the lock; the call was dropped.
    Busy,
}

pub struct ArchiveFlow {
    applications: Arc<dyn ApplicationRepository>,
    generator: Arc<dyn DocumentGenerator>,
    session: SessionState,
    generate_lock: InFlight,
    rebuild_lock: InFlight,
}

impl ArchiveFlow {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        generator: Arc<dyn DocumentGenerator>,
    ) -> Self {
        ArchiveFlow {
            applications,
            generator,
            session: SessionState::default(),
            generate_lock: InFlight::new("generate"),
            rebuild_lock: InFlight::new("rebuild"),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Swaps the repository on auth transitions. Session tracking is left
    /// alone; sign-out resets it separately.
    pub fn set_applications(&mut self, applications: Arc<dyn ApplicationRepository>) {
        self.applications = applications;
    }

    /// Forgets session tracking (sign-out, tests).
    pub fn reset_session(&mut self) {
        self.session = SessionState::default();
    }

    /// Runs one generation action against the current dossier.
    pub async fn generate(
        &mut self,
        auth: Option<&AuthSession>,
        dossier: &Dossier,
        raw_job_text: &str,
        kind: DocumentKind,
        lang: Language,
        prompt: &dyn UserPrompt,
        preview: &dyn PreviewSurface,
    ) -> Result<GenerateOutcome, AppError> {
        let job_description = generation::strip_tags(raw_job_text);
        if job_description.is_empty() {
            prompt.notify("Zalepite oglas za posao.");
            return Err(AppError::Validation("job description is empty".to_string()));
        }

        let is_new_job =
            self.session.last_job_description.as_deref() != Some(job_description.as_str());

        // Solicited before the lock engages, and only when the record will
        // actually be archived.
        let company_name = if is_new_job && auth.is_some() {
            match prompt.prompt(COMPANY_PROMPT, COMPANY_SUGGESTION) {
                Some(name) if !name.trim().is_empty() => name.trim().to_string(),
                _ => UNKNOWN_COMPANY.to_string(),
            }
        } else {
            String::new()
        };

        let Some(_guard) = self.generate_lock.try_begin() else {
            return Ok(GenerateOutcome::Busy);
        };

        info!("Generating {:?} ({} chars of job text)", kind, job_description.len());
        let bytes = match self
            .generator
            .generate(kind, lang, dossier, &job_description)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Document generation failed: {e}");
                prompt.notify("Server prijavio grešku pri generisanju.");
                return Err(e);
            }
        };

        let document = GeneratedDocument {
            file_name: generation::document_file_name(kind, &dossier.full_name, lang),
            bytes,
        };
        preview.present(&document)?;

        let mut archived = None;
        if let (Some(auth), true) = (auth, is_new_job) {
            let new = NewApplication {
                user_id: auth.user_id,
                company_name,
                job_description: job_description.clone(),
                cv_data: dossier.clone(),
            };
            // An insert failure loses the archive record, not the document —
            // the preview already happened and session tracking stays put.
            match self.applications.insert(new).await {
                Ok(row) => {
                    info!("Archived application {} ({})", row.id, row.company_name);
                    self.session.last_job_description = Some(job_description);
                    self.session.last_application_id = Some(row.id);
                    archived = Some(row.id);
                }
                Err(e) => warn!("Failed to archive application: {e}"),
            }
        }

        Ok(GenerateOutcome::Previewed { archived })
    }

    /// Re-issues a document from an archived record, using the stored job
    /// text and dossier snapshot — not the current canonical dossier. Never
    /// creates a new archive record; locks only itself.
    pub async fn rebuild_from_archive(
        &self,
        id: Uuid,
        kind: DocumentKind,
        lang: Language,
        prompt: &dyn UserPrompt,
        preview: &dyn PreviewSurface,
    ) -> Result<GenerateOutcome, AppError> {
        let Some(_guard) = self.rebuild_lock.try_begin() else {
            return Ok(GenerateOutcome::Busy);
        };

        let row = match self.applications.fetch(id).await {
            Ok(row) => row,
            Err(e) => {
                warn!("Failed to fetch archived application {id}: {e}");
                prompt.notify("Greška pri preuzimanju iz arhive.");
                return Err(e);
            }
        };

        match self
            .generator
            .generate(kind, lang, &row.cv_data, &row.job_description)
            .await
        {
            Ok(bytes) => {
                preview.present(&GeneratedDocument {
                    file_name: generation::archive_file_name(lang),
                    bytes,
                })?;
                Ok(GenerateOutcome::Previewed { archived: None })
            }
            Err(e) => {
                warn!("Archive rebuild failed for {id}: {e}");
                prompt.notify("Greška pri preuzimanju iz arhive.");
                Err(e)
            }
        }
    }

    /// All archive records owned by the signed-in user, newest first. Signed
    /// out, the archive is simply empty.
    pub async fn list_applications(
        &self,
        auth: Option<&AuthSession>,
    ) -> Result<Vec<ApplicationRow>, AppError> {
        let Some(auth) = auth else {
            return Ok(Vec::new());
        };
        self.applications.list_for_user(auth.user_id).await
    }

    /// Removes a record after explicit confirmation. Returns whether the
    /// record was deleted; deleting the tracked record clears session
    /// tracking.
    pub async fn delete_application(
        &mut self,
        id: Uuid,
        prompt: &dyn UserPrompt,
    ) -> Result<bool, AppError> {
        if !prompt.confirm("Obrisati ovu aplikaciju iz arhive?") {
            return Ok(false);
        }

        match self.applications.delete(id).await {
            Ok(()) => {
                if self.session.last_application_id == Some(id) {
                    self.session.last_job_description = None;
                    self.session.last_application_id = None;
                }
                info!("Deleted application {id}");
                Ok(true)
            }
            Err(e) => {
                prompt.notify("Greška pri brisanju.");
                Err(e)
            }
        }
    }
}

/// Archive listing markup; free text is escaped, blank company names render
/// as the unknown-company fallback.
pub fn render_listing(applications: &[ApplicationRow]) -> String {
    if applications.is_empty() {
        return format!("<div class=\"empty\">{EMPTY_ARCHIVE_MESSAGE}</div>\n");
    }

    let mut out = String::new();
    for app in applications {
        let company = if app.company_name.trim().is_empty() {
            UNKNOWN_COMPANY
        } else {
            app.company_name.as_str()
        };
        out.push_str(&format!(
            concat!(
                "<div class=\"application\" data-id=\"{id}\">\n",
                "<h4>{company}</h4>\n",
                "<p>{date}</p>\n",
                "<button data-rebuild=\"cv\" data-id=\"{id}\">CV</button>\n",
                "<button data-rebuild=\"cl\" data-id=\"{id}\">Letter</button>\n",
                "<button data-delete=\"{id}\">×</button>\n",
                "</div>\n"
            ),
            id = app.id,
            company = escape_html(company),
            date = app.created_at.format("%d.%m.%Y."),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeApplications {
        rows: Mutex<Vec<ApplicationRow>>,
    }

    impl FakeApplications {
        fn new() -> Arc<Self> {
            Arc::new(FakeApplications {
                rows: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ApplicationRepository for FakeApplications {
        async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ApplicationRow>, AppError> {
            let mut rows: Vec<ApplicationRow> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn fetch(&self, id: Uuid) -> Result<ApplicationRow, AppError> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
        }

        async fn insert(&self, new: NewApplication) -> Result<ApplicationRow, AppError> {
            let row = ApplicationRow {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                company_name: new.company_name,
                job_description: new.job_description,
                cv_data: new.cv_data,
                created_at: Utc::now(),
            };
            self.rows.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn delete(&self, id: Uuid) -> Result<(), AppError> {
            self.rows.lock().unwrap().retain(|r| r.id != id);
            Ok(())
        }
    }

    struct FakeGenerator {
        fail: bool,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeGenerator {
        fn new() -> Arc<Self> {
            Arc::new(FakeGenerator {
                fail: false,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(FakeGenerator {
                fail: true,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DocumentGenerator for FakeGenerator {
        async fn generate(
            &self,
            _kind: DocumentKind,
            _lang: Language,
            dossier: &Dossier,
            job_description: &str,
        ) -> Result<Bytes, AppError> {
            self.calls
                .lock()
                .unwrap()
                .push((dossier.full_name.clone(), job_description.to_string()));
            if self.fail {
                return Err(AppError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(Bytes::from_static(b"%PDF-1.4"))
        }
    }

    struct ScriptedPrompt {
        confirm_answer: bool,
        notifications: Mutex<Vec<String>>,
        prompts: AtomicUsize,
    }

    impl ScriptedPrompt {
        fn new() -> Self {
            ScriptedPrompt {
                confirm_answer: true,
                notifications: Mutex::new(Vec::new()),
                prompts: AtomicUsize::new(0),
            }
        }

        fn refusing() -> Self {
            ScriptedPrompt {
                confirm_answer: false,
                notifications: Mutex::new(Vec::new()),
                prompts: AtomicUsize::new(0),
            }
        }
    }

    impl UserPrompt for ScriptedPrompt {
        fn notify(&self, message: &str) {
            self.notifications.lock().unwrap().push(message.to_string());
        }

        fn confirm(&self, _message: &str) -> bool {
            self.confirm_answer
        }

        fn prompt(&self, _message: &str, _suggestion: &str) -> Option<String> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            Some("Acme doo".to_string())
        }
    }

    struct MemoryPreview {
        shown: Mutex<Vec<String>>,
    }

    impl MemoryPreview {
        fn new() -> Self {
            MemoryPreview {
                shown: Mutex::new(Vec::new()),
            }
        }
    }

    impl PreviewSurface for MemoryPreview {
        fn present(&self, document: &GeneratedDocument) -> Result<(), AppError> {
            self.shown.lock().unwrap().push(document.file_name.clone());
            Ok(())
        }
    }

    fn session() -> AuthSession {
        AuthSession {
            user_id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            access_token: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_same_job_text_archives_at_most_once() {
        let apps = FakeApplications::new();
        let mut flow = ArchiveFlow::new(apps.clone(), FakeGenerator::new());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();
        let auth = session();
        let dossier = Dossier::template();

        let first = flow
            .generate(
                Some(&auth),
                &dossier,
                "Rust developer wanted",
                DocumentKind::Resume,
                Language::Sr,
                &prompt,
                &preview,
            )
            .await
            .unwrap();
        assert!(matches!(first, GenerateOutcome::Previewed { archived: Some(_) }));

        let second = flow
            .generate(
                Some(&auth),
                &dossier,
                "Rust developer wanted",
                DocumentKind::CoverLetter,
                Language::Sr,
                &prompt,
                &preview,
            )
            .await
            .unwrap();
        assert!(matches!(second, GenerateOutcome::Previewed { archived: None }));

        assert_eq!(apps.count(), 1);
        // The company prompt only fires for the archiving branch.
        assert_eq!(prompt.prompts.load(Ordering::SeqCst), 1);
        assert_eq!(preview.shown.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_different_job_text_archives_again() {
        let apps = FakeApplications::new();
        let mut flow = ArchiveFlow::new(apps.clone(), FakeGenerator::new());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();
        let auth = session();
        let dossier = Dossier::template();

        for job in ["first job", "second job"] {
            flow.generate(
                Some(&auth),
                &dossier,
                job,
                DocumentKind::Resume,
                Language::Sr,
                &prompt,
                &preview,
            )
            .await
            .unwrap();
        }
        assert_eq!(apps.count(), 2);
        assert_eq!(
            flow.session().last_job_description.as_deref(),
            Some("second job")
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_generation_previews_without_archiving() {
        let apps = FakeApplications::new();
        let mut flow = ArchiveFlow::new(apps.clone(), FakeGenerator::new());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();

        let outcome = flow
            .generate(
                None,
                &Dossier::template(),
                "Rust developer wanted",
                DocumentKind::Resume,
                Language::Sr,
                &prompt,
                &preview,
            )
            .await
            .unwrap();

        assert_eq!(outcome, GenerateOutcome::Previewed { archived: None });
        assert_eq!(apps.count(), 0);
        assert_eq!(prompt.prompts.load(Ordering::SeqCst), 0);
        assert_eq!(preview.shown.lock().unwrap().len(), 1);
        assert!(flow.session().last_job_description.is_none());
    }

    #[tokio::test]
    async fn test_blank_job_text_is_rejected_before_any_request() {
        let gen = FakeGenerator::new();
        let mut flow = ArchiveFlow::new(FakeApplications::new(), gen.clone());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();

        let result = flow
            .generate(
                None,
                &Dossier::template(),
                "  <p></p> ",
                DocumentKind::Resume,
                Language::Sr,
                &prompt,
                &preview,
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(gen.calls.lock().unwrap().is_empty());
        assert_eq!(
            prompt.notifications.lock().unwrap().as_slice(),
            ["Zalepite oglas za posao."]
        );
    }

    #[tokio::test]
    async fn test_generate_while_locked_is_busy_and_mutates_nothing() {
        let apps = FakeApplications::new();
        let gen = FakeGenerator::new();
        let mut flow = ArchiveFlow::new(apps.clone(), gen.clone());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();
        let auth = session();

        let _guard = flow.generate_lock.try_begin().unwrap();

        let outcome = flow
            .generate(
                Some(&auth),
                &Dossier::template(),
                "Rust developer wanted",
                DocumentKind::Resume,
                Language::Sr,
                &prompt,
                &preview,
            )
            .await
            .unwrap();

        assert_eq!(outcome, GenerateOutcome::Busy);
        assert_eq!(apps.count(), 0);
        assert!(gen.calls.lock().unwrap().is_empty());
        assert_eq!(flow.generate_lock.dropped_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_notifies_and_releases_the_lock() {
        let apps = FakeApplications::new();
        let mut flow = ArchiveFlow::new(apps.clone(), FakeGenerator::failing());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();
        let auth = session();

        let result = flow
            .generate(
                Some(&auth),
                &Dossier::template(),
                "Rust developer wanted",
                DocumentKind::Resume,
                Language::Sr,
                &prompt,
                &preview,
            )
            .await;

        assert!(matches!(result, Err(AppError::Api { status: 500, .. })));
        assert_eq!(apps.count(), 0);
        assert!(flow.session().last_job_description.is_none());
        assert!(!prompt.notifications.lock().unwrap().is_empty());
        // Settled: the lock is free again.
        assert!(!flow.generate_lock.is_busy());
    }

    #[tokio::test]
    async fn test_rebuild_uses_stored_snapshot_not_current_dossier() {
        let apps = FakeApplications::new();
        let gen = FakeGenerator::new();
        let flow = ArchiveFlow::new(apps.clone(), gen.clone());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();

        let mut snapshot = Dossier::template();
        snapshot.full_name = "Stari Profil".to_string();
        let row = apps
            .insert(NewApplication {
                user_id: Uuid::new_v4(),
                company_name: "Acme doo".to_string(),
                job_description: "archived job text".to_string(),
                cv_data: snapshot,
            })
            .await
            .unwrap();

        let outcome = flow
            .rebuild_from_archive(row.id, DocumentKind::CoverLetter, Language::En, &prompt, &preview)
            .await
            .unwrap();

        assert_eq!(outcome, GenerateOutcome::Previewed { archived: None });
        assert_eq!(apps.count(), 1);
        let calls = gen.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), [("Stari Profil".to_string(), "archived job text".to_string())]);
        assert_eq!(
            preview.shown.lock().unwrap().as_slice(),
            ["CVespresso_Archive_en.pdf"]
        );
    }

    #[tokio::test]
    async fn test_rebuild_missing_record_notifies() {
        let flow = ArchiveFlow::new(FakeApplications::new(), FakeGenerator::new());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();

        let result = flow
            .rebuild_from_archive(
                Uuid::new_v4(),
                DocumentKind::Resume,
                Language::Sr,
                &prompt,
                &preview,
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(
            prompt.notifications.lock().unwrap().as_slice(),
            ["Greška pri preuzimanju iz arhive."]
        );
        assert!(!flow.rebuild_lock.is_busy());
    }

    #[tokio::test]
    async fn test_delete_tracked_record_clears_session() {
        let apps = FakeApplications::new();
        let mut flow = ArchiveFlow::new(apps.clone(), FakeGenerator::new());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();
        let auth = session();

        flow.generate(
            Some(&auth),
            &Dossier::template(),
            "tracked job",
            DocumentKind::Resume,
            Language::Sr,
            &prompt,
            &preview,
        )
        .await
        .unwrap();
        let tracked = flow.session().last_application_id.unwrap();

        assert!(flow.delete_application(tracked, &prompt).await.unwrap());
        assert!(flow.session().last_application_id.is_none());
        assert!(flow.session().last_job_description.is_none());
        assert_eq!(apps.count(), 0);
    }

    #[tokio::test]
    async fn test_delete_other_record_keeps_session() {
        let apps = FakeApplications::new();
        let mut flow = ArchiveFlow::new(apps.clone(), FakeGenerator::new());
        let prompt = ScriptedPrompt::new();
        let preview = MemoryPreview::new();
        let auth = session();

        flow.generate(
            Some(&auth),
            &Dossier::template(),
            "tracked job",
            DocumentKind::Resume,
            Language::Sr,
            &prompt,
            &preview,
        )
        .await
        .unwrap();

        let other = apps
            .insert(NewApplication {
                user_id: auth.user_id,
                company_name: "Other".to_string(),
                job_description: "other job".to_string(),
                cv_data: Dossier::template(),
            })
            .await
            .unwrap();

        assert!(flow.delete_application(other.id, &prompt).await.unwrap());
        assert_eq!(flow.session().last_job_description.as_deref(), Some("tracked job"));
        assert!(flow.session().last_application_id.is_some());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let apps = FakeApplications::new();
        let mut flow = ArchiveFlow::new(apps.clone(), FakeGenerator::new());
        let prompt = ScriptedPrompt::refusing();

        let row = apps
            .insert(NewApplication {
                user_id: Uuid::new_v4(),
                company_name: "Acme doo".to_string(),
                job_description: "job".to_string(),
                cv_data: Dossier::template(),
            })
            .await
            .unwrap();

        assert!(!flow.delete_application(row.id, &prompt).await.unwrap());
        assert_eq!(apps.count(), 1);
    }

    #[tokio::test]
    async fn test_listing_is_empty_when_signed_out() {
        let flow = ArchiveFlow::new(FakeApplications::new(), FakeGenerator::new());
        assert!(flow.list_applications(None).await.unwrap().is_empty());
    }

    #[test]
    fn test_render_listing_empty_state() {
        let markup = render_listing(&[]);
        assert!(markup.contains(EMPTY_ARCHIVE_MESSAGE));
    }

    #[test]
    fn test_render_listing_escapes_company_and_formats_date() {
        let row = ApplicationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company_name: "<b>Acme</b>".to_string(),
            job_description: "job".to_string(),
            cv_data: Dossier::template(),
            created_at: "2026-08-05T10:00:00Z".parse().unwrap(),
        };
        let markup = render_listing(&[row]);
        assert!(markup.contains("&lt;b&gt;Acme&lt;/b&gt;"));
        assert!(markup.contains("05.08.2026."));
        assert!(!markup.contains("<b>Acme</b>"));
    }
}
