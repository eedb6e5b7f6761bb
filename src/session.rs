use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::supabase::auth::Session;

/// Shared session context. Acquired once after sign-in and read by every
/// service, instead of each screen re-checking the backend for a user.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    pub async fn current(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// Session presence gates every authenticated operation. Absence is the
    /// client-side equivalent of a redirect to the auth screen.
    pub async fn require(&self) -> AppResult<Session> {
        self.current()
            .await
            .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))
    }

    pub async fn user_id(&self) -> AppResult<Uuid> {
        Ok(self.require().await?.user.id)
    }

    pub async fn access_token(&self) -> Option<String> {
        self.current().await.map(|s| s.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supabase::auth::AuthUser;

    fn session(user_id: Uuid) -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: Some(3600),
            token_type: Some("bearer".to_string()),
            user: AuthUser {
                id: user_id,
                email: Some("ana@ufmg.br".to_string()),
                user_metadata: serde_json::json!({ "full_name": "Ana" }),
            },
        }
    }

    #[tokio::test]
    async fn require_fails_without_session() {
        let store = SessionStore::new();
        assert!(matches!(
            store.require().await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn user_id_reads_the_stored_session() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        store.set(session(id)).await;
        assert_eq!(store.user_id().await.unwrap(), id);

        store.clear().await;
        assert!(store.user_id().await.is_err());
    }
}
