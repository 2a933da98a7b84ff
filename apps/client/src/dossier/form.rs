//! Structured form model for the dossier editor.
//!
//! Binding is manual and two-way: `render` produces field markup from the
//! working copy, a host surface collects edited values into a `FieldValues`
//! map, and `sync_from_fields` writes them back. Every sequence entry owns a
//! stable id assigned when the form is built or the entry is added, and field
//! keys embed that id (`experience.{id}.role`), so add/remove never depends
//! on document position.
//!
//! Skills are comma-separated free text. The round trip is lossy for embedded
//! commas: `"A, B,C"` syncs to `["A", "B", "C"]` and renders back as
//! `"A, B, C"`. Documented limitation, kept as-is.

// add/remove/field_values are the surface a host editor drives; the CLI only
// exercises render and save.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt::Write as _;

use uuid::Uuid;

use crate::models::dossier::{
    CertificationEntry, Dossier, EducationEntry, ExperienceEntry, ProjectEntry, Skills,
};

/// Field key → current value, as read off the editor surface.
pub type FieldValues = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Education,
    Experience,
    Certification,
}

#[derive(Debug, Clone)]
struct FormEntry<T> {
    id: Uuid,
    data: T,
}

impl<T> FormEntry<T> {
    fn new(data: T) -> Self {
        FormEntry {
            id: Uuid::new_v4(),
            data,
        }
    }
}

/// Working copy of the dossier during an edit session. Holds exclusive write
/// access to the canonical record until `save` hands the result back.
#[derive(Debug, Clone)]
pub struct DossierForm {
    full_name: String,
    title: String,
    motto: String,
    email: String,
    phone: String,
    location: String,
    linkedin: String,
    github: String,
    website: String,
    education: Vec<FormEntry<EducationEntry>>,
    experience: Vec<FormEntry<ExperienceEntry>>,
    certifications: Vec<FormEntry<CertificationEntry>>,
    skills: Skills,
    /// Not form-edited; carried through save untouched.
    projects: Vec<ProjectEntry>,
}

impl DossierForm {
    pub fn from_dossier(dossier: &Dossier) -> Self {
        DossierForm {
            full_name: dossier.full_name.clone(),
            title: dossier.title.clone(),
            motto: dossier.motto.clone(),
            email: dossier.email.clone(),
            phone: dossier.phone.clone(),
            location: dossier.location.clone(),
            linkedin: dossier.linkedin.clone(),
            github: dossier.github.clone(),
            website: dossier.website.clone(),
            education: dossier
                .education
                .iter()
                .cloned()
                .map(FormEntry::new)
                .collect(),
            experience: dossier
                .experience
                .iter()
                .cloned()
                .map(FormEntry::new)
                .collect(),
            certifications: dossier
                .certifications
                .iter()
                .cloned()
                .map(FormEntry::new)
                .collect(),
            skills: dossier.skills.clone(),
            projects: dossier.projects.clone(),
        }
    }

    /// Rebuilds the canonical dossier from the working copy.
    pub fn to_dossier(&self) -> Dossier {
        Dossier {
            full_name: self.full_name.clone(),
            title: self.title.clone(),
            motto: self.motto.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            location: self.location.clone(),
            linkedin: self.linkedin.clone(),
            github: self.github.clone(),
            website: self.website.clone(),
            education: self.education.iter().map(|e| e.data.clone()).collect(),
            experience: self.experience.iter().map(|e| e.data.clone()).collect(),
            skills: self.skills.clone(),
            certifications: self.certifications.iter().map(|e| e.data.clone()).collect(),
            projects: self.projects.clone(),
        }
    }

    /// The current field-key → value map — what a host surface reads back
    /// out of the rendered fields before an edit.
    pub fn field_values(&self) -> FieldValues {
        let mut values = FieldValues::new();
        values.insert("full_name".into(), self.full_name.clone());
        values.insert("title".into(), self.title.clone());
        values.insert("motto".into(), self.motto.clone());
        values.insert("email".into(), self.email.clone());
        values.insert("phone".into(), self.phone.clone());
        values.insert("location".into(), self.location.clone());
        values.insert("linkedin".into(), self.linkedin.clone());
        values.insert("github".into(), self.github.clone());
        values.insert("website".into(), self.website.clone());

        for entry in &self.education {
            values.insert(entry_key("education", entry.id, "degree"), entry.data.degree.clone());
            values.insert(entry_key("education", entry.id, "school"), entry.data.school.clone());
            values.insert(entry_key("education", entry.id, "year"), entry.data.year.clone());
        }
        for entry in &self.experience {
            values.insert(entry_key("experience", entry.id, "role"), entry.data.role.clone());
            values.insert(
                entry_key("experience", entry.id, "company"),
                entry.data.company.clone(),
            );
            values.insert(
                entry_key("experience", entry.id, "period"),
                entry.data.period.clone(),
            );
            values.insert(
                entry_key("experience", entry.id, "desc"),
                entry.data.description.clone(),
            );
        }
        for entry in &self.certifications {
            values.insert(
                entry_key("certifications", entry.id, "name"),
                entry.data.name.clone(),
            );
            values.insert(
                entry_key("certifications", entry.id, "year"),
                entry.data.year.clone(),
            );
        }

        values.insert("skills.technical".into(), join_skills(&self.skills.technical));
        values.insert("skills.industry".into(), join_skills(&self.skills.industry));
        values.insert("skills.soft".into(), join_skills(&self.skills.soft));
        values
    }

    /// Overwrites the working copy from the field values. A key absent from
    /// `values` reads as blank; unknown keys are ignored. Values are trimmed.
    pub fn sync_from_fields(&mut self, values: &FieldValues) {
        let get = |key: String| -> String {
            values
                .get(&key)
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        self.full_name = get("full_name".into());
        self.title = get("title".into());
        self.motto = get("motto".into());
        self.email = get("email".into());
        self.phone = get("phone".into());
        self.location = get("location".into());
        self.linkedin = get("linkedin".into());
        self.github = get("github".into());
        self.website = get("website".into());

        for entry in &mut self.education {
            entry.data.degree = get(entry_key("education", entry.id, "degree"));
            entry.data.school = get(entry_key("education", entry.id, "school"));
            entry.data.year = get(entry_key("education", entry.id, "year"));
        }
        for entry in &mut self.experience {
            entry.data.role = get(entry_key("experience", entry.id, "role"));
            entry.data.company = get(entry_key("experience", entry.id, "company"));
            entry.data.period = get(entry_key("experience", entry.id, "period"));
            entry.data.description = get(entry_key("experience", entry.id, "desc"));
        }
        for entry in &mut self.certifications {
            entry.data.name = get(entry_key("certifications", entry.id, "name"));
            entry.data.year = get(entry_key("certifications", entry.id, "year"));
        }

        self.skills = Skills {
            technical: parse_skills(&get("skills.technical".into())),
            industry: parse_skills(&get("skills.industry".into())),
            soft: parse_skills(&get("skills.soft".into())),
        };
    }

    /// Syncs in-progress edits first so nothing the user typed is discarded,
    /// then appends one blank entry. The host re-renders afterwards.
    pub fn add_entry(&mut self, kind: EntryKind, values: &FieldValues) -> Uuid {
        self.sync_from_fields(values);
        match kind {
            EntryKind::Education => {
                let entry = FormEntry::new(EducationEntry::default());
                let id = entry.id;
                self.education.push(entry);
                id
            }
            EntryKind::Experience => {
                let entry = FormEntry::new(ExperienceEntry::default());
                let id = entry.id;
                self.experience.push(entry);
                id
            }
            EntryKind::Certification => {
                let entry = FormEntry::new(CertificationEntry::default());
                let id = entry.id;
                self.certifications.push(entry);
                id
            }
        }
    }

    /// Syncs first, then removes the entry with the given id. An id not in
    /// the form is a no-op.
    pub fn remove_entry(&mut self, kind: EntryKind, id: Uuid, values: &FieldValues) {
        self.sync_from_fields(values);
        match kind {
            EntryKind::Education => self.education.retain(|e| e.id != id),
            EntryKind::Experience => self.experience.retain(|e| e.id != id),
            EntryKind::Certification => self.certifications.retain(|e| e.id != id),
        }
    }

    /// Syncs, prunes all-blank entries and hands back the canonical record
    /// for the caller to persist locally and push remotely.
    pub fn save(&mut self, values: &FieldValues) -> Dossier {
        self.sync_from_fields(values);
        let mut dossier = self.to_dossier();
        dossier.prune_blank_entries();
        dossier
    }

    /// Produces the editor markup from the working copy. All interpolated
    /// text is escaped.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("<form id=\"dossierForm\">\n");

        out.push_str("<section id=\"personal\">\n");
        out.push_str("<h3>01. Lični Podaci &amp; Linkovi</h3>\n");
        push_input(&mut out, "full_name", &self.full_name, "Puno ime");
        push_input(&mut out, "title", &self.title, "Titula");
        push_input(&mut out, "email", &self.email, "Email");
        push_input(&mut out, "phone", &self.phone, "Telefon");
        push_input(&mut out, "location", &self.location, "Lokacija");
        push_input(&mut out, "linkedin", &self.linkedin, "LinkedIn URL");
        push_input(&mut out, "github", &self.github, "GitHub URL");
        push_input(&mut out, "website", &self.website, "Lični vebsajt / Portfolio");
        push_textarea(&mut out, "motto", &self.motto, "Motto");
        out.push_str("</section>\n");

        out.push_str("<section id=\"education\">\n");
        out.push_str("<h3>02. Obrazovanje</h3>\n");
        out.push_str("<button type=\"button\" data-add=\"education\">+ Dodaj</button>\n");
        for entry in &self.education {
            let _ = writeln!(out, "<fieldset data-entry=\"{}\">", entry.id);
            push_input(
                &mut out,
                &entry_key("education", entry.id, "degree"),
                &entry.data.degree,
                "Zvanje",
            );
            push_input(
                &mut out,
                &entry_key("education", entry.id, "school"),
                &entry.data.school,
                "Škola",
            );
            push_input(
                &mut out,
                &entry_key("education", entry.id, "year"),
                &entry.data.year,
                "Godina",
            );
            push_remove_button(&mut out, "education", entry.id);
            out.push_str("</fieldset>\n");
        }
        out.push_str("</section>\n");

        out.push_str("<section id=\"experience\">\n");
        out.push_str("<h3>03. Iskustvo</h3>\n");
        out.push_str("<button type=\"button\" data-add=\"experience\">+ Dodaj</button>\n");
        for entry in &self.experience {
            let _ = writeln!(out, "<fieldset data-entry=\"{}\">", entry.id);
            push_input(
                &mut out,
                &entry_key("experience", entry.id, "role"),
                &entry.data.role,
                "Pozicija",
            );
            push_input(
                &mut out,
                &entry_key("experience", entry.id, "company"),
                &entry.data.company,
                "Firma",
            );
            push_input(
                &mut out,
                &entry_key("experience", entry.id, "period"),
                &entry.data.period,
                "Period",
            );
            push_textarea(
                &mut out,
                &entry_key("experience", entry.id, "desc"),
                &entry.data.description,
                "Opis",
            );
            push_remove_button(&mut out, "experience", entry.id);
            out.push_str("</fieldset>\n");
        }
        out.push_str("</section>\n");

        out.push_str("<section id=\"skills\">\n");
        out.push_str("<h3>04. Veštine</h3>\n");
        push_textarea(
            &mut out,
            "skills.technical",
            &join_skills(&self.skills.technical),
            "Tehničke",
        );
        push_textarea(
            &mut out,
            "skills.industry",
            &join_skills(&self.skills.industry),
            "Industrijske",
        );
        push_textarea(&mut out, "skills.soft", &join_skills(&self.skills.soft), "Meke veštine");
        out.push_str("</section>\n");

        out.push_str("<section id=\"certifications\">\n");
        out.push_str("<h3>05. Sertifikati</h3>\n");
        out.push_str("<button type=\"button\" data-add=\"certifications\">+ Dodaj</button>\n");
        for entry in &self.certifications {
            let _ = writeln!(out, "<fieldset data-entry=\"{}\">", entry.id);
            push_input(
                &mut out,
                &entry_key("certifications", entry.id, "name"),
                &entry.data.name,
                "Naziv",
            );
            push_input(
                &mut out,
                &entry_key("certifications", entry.id, "year"),
                &entry.data.year,
                "Godina",
            );
            push_remove_button(&mut out, "certifications", entry.id);
            out.push_str("</fieldset>\n");
        }
        out.push_str("</section>\n");

        out.push_str("<button type=\"submit\">Sačuvaj Master Dosije</button>\n");
        out.push_str("</form>\n");
        out
    }
}

fn entry_key(kind: &str, id: Uuid, part: &str) -> String {
    format!("{kind}.{id}.{part}")
}

fn push_input(out: &mut String, name: &str, value: &str, placeholder: &str) {
    let _ = writeln!(
        out,
        "<input type=\"text\" name=\"{}\" value=\"{}\" placeholder=\"{}\">",
        escape_html(name),
        escape_html(value),
        escape_html(placeholder)
    );
}

fn push_textarea(out: &mut String, name: &str, value: &str, placeholder: &str) {
    let _ = writeln!(
        out,
        "<textarea name=\"{}\" placeholder=\"{}\">{}</textarea>",
        escape_html(name),
        escape_html(placeholder),
        escape_html(value)
    );
}

fn push_remove_button(out: &mut String, kind: &str, id: Uuid) {
    let _ = writeln!(
        out,
        "<button type=\"button\" data-remove=\"{kind}\" data-entry-id=\"{id}\">×</button>"
    );
}

/// Escapes free text for interpolation into markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn parse_skills(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_skills(skills: &[String]) -> String {
    skills.join(", ")
}
