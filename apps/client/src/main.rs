mod app;
mod archive;
mod auth;
mod config;
mod dossier;
mod errors;
mod generation;
mod models;
mod prefs;
mod remote;
mod store;
mod sync;
mod ui;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::app::App;
use crate::archive::{render_listing, GenerateOutcome};
use crate::config::Config;
use crate::dossier::form::{DossierForm, FieldValues};
use crate::generation::preview::DownloadSink;
use crate::generation::{DocumentKind, Language};
use crate::ui::StdioPrompt;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CVespresso client — dossier editing, remote sync and PDF generation", long_about = None)]
struct Cli {
    /// Document language
    #[arg(long, global = true, value_enum, default_value = "sr")]
    lang: LangArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LangArg {
    Sr,
    En,
}

impl From<LangArg> for Language {
    fn from(lang: LangArg) -> Self {
        match lang {
            LangArg::Sr => Language::Sr,
            LangArg::En => Language::En,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// Résumé
    Cv,
    /// Cover letter
    Cl,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Cv => DocumentKind::Resume,
            KindArg::Cl => DocumentKind::CoverLetter,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in via the identity provider
    Login {
        #[arg(long, default_value = "google")]
        provider: String,
        /// Access token handed back after the provider redirect
        #[arg(long)]
        access_token: Option<String>,
    },
    /// Sign out and clear local data
    Logout,
    /// Master dossier
    Dossier {
        #[command(subcommand)]
        action: DossierAction,
    },
    /// Generate a document for a job description
    Generate {
        #[arg(long, value_enum)]
        kind: KindArg,
        /// File holding the job description text
        #[arg(long)]
        job_file: PathBuf,
    },
    /// Archived applications
    Archive {
        #[command(subcommand)]
        action: ArchiveAction,
    },
    /// Toggle the light/dark theme
    Theme,
}

#[derive(Subcommand)]
enum DossierAction {
    /// Print the canonical dossier as JSON
    Show,
    /// Print the editor form markup
    Render,
    /// Apply edited field values (JSON map) and save
    Save {
        #[arg(long)]
        fields: PathBuf,
    },
}

#[derive(Subcommand)]
enum ArchiveAction {
    /// List archived applications, newest first
    List,
    /// Re-issue a document from an archived application
    Rebuild {
        id: Uuid,
        #[arg(long, value_enum)]
        kind: KindArg,
    },
    /// Delete an archived application
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CVespresso client v{}", env!("CARGO_PKG_VERSION"));

    let prompt = Arc::new(StdioPrompt);
    let preview = Arc::new(DownloadSink::new(&config.output_dir));
    let mut app = App::new(config, prompt, preview)?;

    // Session restore is an external trigger: pulls the remote dossier.
    app.restore_session().await?;

    let lang = Language::from(cli.lang);

    match cli.command {
        Commands::Login {
            provider,
            access_token,
        } => match access_token {
            Some(token) => {
                app.sign_in_with_token(&token).await?;
                if let Some(session) = app.session() {
                    println!("Prijavljeni ste kao {}.", session.email);
                }
            }
            None => {
                println!("Otvorite u pregledaču i prijavite se:");
                println!("{}", app.authorize_url(&provider));
                println!("Zatim: client login --access-token <token>");
            }
        },
        Commands::Logout => {
            app.sign_out().await?;
            println!("Odjavljeni ste.");
        }
        Commands::Dossier { action } => match action {
            DossierAction::Show => {
                println!("{}", serde_json::to_string_pretty(app.dossier())?);
            }
            DossierAction::Render => {
                print!("{}", DossierForm::from_dossier(app.dossier()).render());
            }
            DossierAction::Save { fields } => {
                let raw = fs::read_to_string(&fields)
                    .with_context(|| format!("Cannot read field values from {}", fields.display()))?;
                let values: FieldValues = serde_json::from_str(&raw)?;
                let mut form = DossierForm::from_dossier(app.dossier());
                app.save_dossier(&mut form, &values).await?;
            }
        },
        Commands::Generate { kind, job_file } => {
            let job_text = fs::read_to_string(&job_file)
                .with_context(|| format!("Cannot read job description from {}", job_file.display()))?;
            match app.generate(&job_text, kind.into(), lang).await? {
                GenerateOutcome::Previewed { archived } => {
                    if let Some(id) = archived {
                        println!("Aplikacija arhivirana: {id}");
                    }
                }
                GenerateOutcome::Busy => println!("Generisanje je već u toku."),
            }
        }
        Commands::Archive { action } => match action {
            ArchiveAction::List => {
                let applications = app.list_applications().await?;
                print!("{}", render_listing(&applications));
            }
            ArchiveAction::Rebuild { id, kind } => {
                if let GenerateOutcome::Busy =
                    app.rebuild_from_archive(id, kind.into(), lang).await?
                {
                    println!("Preuzimanje iz arhive je već u toku.");
                }
            }
            ArchiveAction::Delete { id } => {
                if app.delete_application(id).await? {
                    println!("Aplikacija obrisana.");
                }
            }
        },
        Commands::Theme => {
            let theme = app.toggle_theme()?;
            println!("Tema: {theme:?}");
        }
    }

    Ok(())
}
