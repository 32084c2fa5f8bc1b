pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod formatting;
pub mod session;
pub mod validation;

use anyhow::{Context, Result};
use config::Config;
use std::sync::Arc;

use crate::api::{ContactApi, HttpContactApi};
use crate::auth::AuthFlow;
use crate::contacts::ContactListCoordinator;
use crate::session::{FileStore, SessionContext};

/// Everything a command needs: configuration, the API transport and the
/// persisted session.
pub struct AppContext {
    pub config: Config,
    pub api: Arc<dyn ContactApi>,
    pub session: Arc<SessionContext>,
}

impl AppContext {
    /// Build the HTTP transport and load the session file named in `config`
    pub fn new(config: Config) -> Result<Self> {
        let api = HttpContactApi::new(&config.api.base_url, config.api.timeout())
            .context("Failed to create HTTP client")?;
        let store = FileStore::new(&config.session.path);
        let session = SessionContext::load(Arc::new(store)).with_context(|| {
            format!("Failed to load session from {}", config.session.path.display())
        })?;
        Ok(Self::with_parts(config, Arc::new(api), Arc::new(session)))
    }

    pub fn with_parts(
        config: Config,
        api: Arc<dyn ContactApi>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            config,
            api,
            session,
        }
    }

    pub fn auth_flow(&self) -> AuthFlow {
        AuthFlow::new(self.api.clone(), self.session.clone())
    }

    pub fn contact_list(&self) -> ContactListCoordinator {
        ContactListCoordinator::new(
            self.api.clone(),
            self.session.clone(),
            self.config.contacts.page_size,
            self.config.contacts.search_debounce_ms,
        )
    }
}
