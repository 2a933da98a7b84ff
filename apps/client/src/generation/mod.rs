//! Client for the document generation service: one request per action,
//! carrying the job description and the full dossier snapshot, answered with
//! the binary PDF or an error status.

pub mod preview;

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::dossier::Dossier;

const REQUEST_TIMEOUT_SECS: u64 = 120;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

/// Which document the generator produces. The two kinds live on separate
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "/generate-pdf/",
            DocumentKind::CoverLetter => "/generate-cover-letter/",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "CV",
            DocumentKind::CoverLetter => "CoverLetter",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    Sr,
    En,
}

impl Language {
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Sr => "sr",
            Language::En => "en",
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    job_description: &'a str,
    user_dossier: &'a Dossier,
}

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Sends one generation request and returns the binary document.
    async fn generate(
        &self,
        kind: DocumentKind,
        lang: Language,
        dossier: &Dossier,
        job_description: &str,
    ) -> Result<Bytes, AppError>;
}

#[derive(Clone)]
pub struct HttpGenerator {
    client: Client,
    base_url: String,
}

impl HttpGenerator {
    pub fn new(base_url: &str) -> Self {
        HttpGenerator {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DocumentGenerator for HttpGenerator {
    async fn generate(
        &self,
        kind: DocumentKind,
        lang: Language,
        dossier: &Dossier,
        job_description: &str,
    ) -> Result<Bytes, AppError> {
        let url = format!(
            "{}{}?lang={}",
            self.base_url,
            kind.endpoint_path(),
            lang.tag()
        );
        debug!("Requesting {:?} from {url}", kind);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                job_description,
                user_dossier: dossier,
            })
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

        let body = response.bytes().await?;
        info!("Received {:?} document ({} bytes)", kind, body.len());
        Ok(body)
    }
}

/// Strips markup tags and surrounding whitespace from free text before it is
/// sent anywhere.
pub fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").trim().to_string()
}

/// Download filename for a freshly generated document:
/// kind prefix, subject name with whitespace collapsed to underscores, and
/// the language tag.
pub fn document_file_name(kind: DocumentKind, full_name: &str, lang: Language) -> String {
    let cleaned = strip_tags(full_name);
    let name = if cleaned.is_empty() {
        "User"
    } else {
        cleaned.as_str()
    };
    let name: String = name.split_whitespace().collect::<Vec<_>>().join("_");
    format!(
        "CVespresso_{}_{}_{}.pdf",
        kind.file_prefix(),
        name,
        lang.tag()
    )
}

/// Download filename for a document re-issued from the archive.
pub fn archive_file_name(lang: Language) -> String {
    format!("CVespresso_Archive_{}.pdf", lang.tag())
}
