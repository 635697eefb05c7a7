use std::sync::Arc;

use crate::auth::CredentialCheck;
use crate::draft::DraftClient;

/// Shared application context, built once in `main` and handed to the
/// route layer via `web::Data`. No module-level globals.
pub struct AppState {
    pub credentials: Arc<dyn CredentialCheck>,
    pub draft_client: DraftClient,
}

pub mod auth;
pub mod config;
pub mod draft;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod setup;
