pub mod auth;
pub mod postgrest;
pub mod realtime;

use crate::config::Config;
use crate::session::SessionStore;

/// Handle to the hosted backend: auth endpoints, table API and realtime feed
/// all hang off this. Cheap to clone; the HTTP client and session store are
/// shared.
#[derive(Clone)]
pub struct SupabaseClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: Config,
    pub session: SessionStore,
}

impl SupabaseClient {
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            session: SessionStore::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bearer token for authenticated calls. Falls back to the anon key when
    /// no one is signed in, matching how the hosted backend expects public
    /// reads.
    pub(crate) async fn bearer(&self) -> String {
        self.session
            .access_token()
            .await
            .unwrap_or_else(|| self.config.supabase_anon_key.clone())
    }
}
