use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;

use crate::application::ports::IdentityVerifier;
use crate::application::services::{ConversationService, RelayService};

#[derive(Clone)]
pub struct AppState {
    pub relay_service: Arc<RelayService>,
    pub conversation_service: Arc<ConversationService>,
    pub identity_verifier: Arc<dyn IdentityVerifier>,
    pub sse_keep_alive: Duration,
}

impl FromRef<AppState> for Arc<dyn IdentityVerifier> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.identity_verifier)
    }
}
