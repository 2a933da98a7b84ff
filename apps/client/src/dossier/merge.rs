//! Builds the canonical dossier from the stored record plus the built-in
//! template, field by field. Stored data may be absent, malformed or
//! partially populated; the merge always produces a complete record and
//! re-persists it, healing whatever was in the slot before.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::dossier::{Dossier, Skills, PLACEHOLDER_NAME};
use crate::store::{LocalStore, DOSSIER_SLOT};

/// Loads the dossier slot, merges it over the template and writes the merged
/// record back. Malformed JSON in the slot is logged and cleared; processing
/// continues with template defaults.
pub fn initialize(store: &LocalStore) -> Result<Dossier, AppError> {
    let stored: Option<Value> = match store.read(DOSSIER_SLOT)? {
        Some(raw) if !raw.trim().is_empty() => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Malformed dossier slot, clearing it: {e}");
                store.clear(DOSSIER_SLOT)?;
                None
            }
        },
        _ => None,
    };

    let dossier = merge_with_template(stored.as_ref());
    store.write_json(DOSSIER_SLOT, &dossier)?;
    info!("Dossier initialized (stored record used: {})", stored.is_some());
    Ok(dossier)
}

/// Merges a stored record over the template. The record as a whole counts as
/// valid only when its `full_name` is present, non-blank and not the
/// placeholder; individual fields still fall back independently when blank
/// or of the wrong shape.
pub fn merge_with_template(stored: Option<&Value>) -> Dossier {
    let template = Dossier::template();

    let record_valid = stored.map(has_valid_name).unwrap_or(false);

    Dossier {
        full_name: scalar(stored, record_valid, "full_name", template.full_name),
        title: scalar(stored, record_valid, "title", template.title),
        motto: scalar(stored, record_valid, "motto", template.motto),
        email: scalar(stored, record_valid, "email", template.email),
        phone: scalar(stored, record_valid, "phone", template.phone),
        location: scalar(stored, record_valid, "location", template.location),
        linkedin: scalar(stored, record_valid, "linkedin", template.linkedin),
        github: scalar(stored, record_valid, "github", template.github),
        website: scalar(stored, record_valid, "website", template.website),
        experience: sequence(stored, record_valid, "experience", template.experience),
        education: sequence(stored, record_valid, "education", template.education),
        skills: skills(stored, record_valid, template.skills),
        certifications: sequence(stored, record_valid, "certifications", template.certifications),
        projects: sequence(stored, record_valid, "projects", template.projects),
    }
}

fn has_valid_name(stored: &Value) -> bool {
    stored
        .get("full_name")
        .and_then(Value::as_str)
        .map(|name| {
            let name = name.trim();
            !name.is_empty() && name != PLACEHOLDER_NAME
        })
        .unwrap_or(false)
}

fn scalar(stored: Option<&Value>, record_valid: bool, field: &str, fallback: String) -> String {
    if !record_valid {
        return fallback;
    }
    match stored.and_then(|v| v.get(field)).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => fallback,
    }
}

/// Sequence fields fall back to a deep copy of the template sequence when
/// the record is invalid or the field is not a proper sequence. A present
/// empty sequence is kept as-is.
fn sequence<T: DeserializeOwned>(
    stored: Option<&Value>,
    record_valid: bool,
    field: &str,
    fallback: Vec<T>,
) -> Vec<T> {
    if !record_valid {
        return fallback;
    }
    match stored.and_then(|v| v.get(field)) {
        Some(value) if value.is_array() => {
            serde_json::from_value(value.clone()).unwrap_or(fallback)
        }
        _ => fallback,
    }
}

fn skills(stored: Option<&Value>, record_valid: bool, fallback: Skills) -> Skills {
    if !record_valid {
        return fallback;
    }
    match stored.and_then(|v| v.get("skills")) {
        Some(value) if value.is_object() => {
            serde_json::from_value(value.clone()).unwrap_or(fallback)
        }
        _ => fallback,
    }
}
