//! The master dossier — the user's canonical résumé data record.
//!
//! Serialized as-is into the local dossier slot, the remote `profiles` row
//! and the document generation request body, so field names are part of the
//! record format.

use serde::{Deserialize, Serialize};

/// Template value for `full_name`; a stored record carrying it is treated
/// as never having been filled in.
pub const PLACEHOLDER_NAME: &str = "Ime i Prezime";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub period: String,
    /// Wire name `desc` — records written by earlier clients use it.
    #[serde(default, rename = "desc")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificationEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "desc")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub industry: Vec<String>,
    #[serde(default)]
    pub soft: Vec<String>,
}

/// The canonical profile record. Owned by the `App` coordinator; the form
/// model has exclusive write access during an edit session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub motto: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub certifications: Vec<CertificationEntry>,
    /// Carried through persistence and generation but not form-edited.
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
}

impl Dossier {
    /// The built-in template every merge falls back to, field by field.
    pub fn template() -> Self {
        Dossier {
            full_name: PLACEHOLDER_NAME.to_string(),
            title: "Vaša Profesionalna Titula".to_string(),
            motto: "Vaš profesionalni moto".to_string(),
            email: "vas.email@primer.com".to_string(),
            phone: "+381 60 000 0000".to_string(),
            location: "Grad, Država".to_string(),
            linkedin: "linkedin.com/in/korisnik".to_string(),
            github: "github.com/korisnik".to_string(),
            website: "www.mojsajt.com".to_string(),
            experience: vec![ExperienceEntry {
                role: "Vaša Pozicija".to_string(),
                company: "Naziv Firme".to_string(),
                period: "2020 - 2024".to_string(),
                description: "Opis dostignuća".to_string(),
            }],
            education: vec![EducationEntry {
                degree: "Stepen obrazovanja".to_string(),
                school: "Naziv škole".to_string(),
                year: "Godina".to_string(),
            }],
            skills: Skills {
                technical: vec!["Python".to_string(), "SQL".to_string()],
                industry: vec!["Offset štampa".to_string()],
                soft: vec!["Liderstvo".to_string()],
            },
            certifications: vec![CertificationEntry {
                name: "Naziv Sertifikata".to_string(),
                year: "2026".to_string(),
            }],
            projects: vec![ProjectEntry {
                name: "Naziv Projekta".to_string(),
                description: "Opis projekta".to_string(),
            }],
        }
    }

    /// Drops entries whose required fields are all blank. Runs before every
    /// persistence so placeholder rows added in the editor never reach
    /// storage.
    pub fn prune_blank_entries(&mut self) {
        self.education
            .retain(|e| !e.degree.trim().is_empty() || !e.school.trim().is_empty());
        self.experience
            .retain(|e| !e.role.trim().is_empty() || !e.company.trim().is_empty());
        self.certifications.retain(|c| !c.name.trim().is_empty());
    }
}
