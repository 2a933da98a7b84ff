pub mod application;
pub mod auth;
pub mod dossier;
