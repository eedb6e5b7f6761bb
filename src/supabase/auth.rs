use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{from_api_error, ApiErrorBody, AppError, AppResult};
use crate::supabase::SupabaseClient;

/// Authenticated user as returned by the identity service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata.get("full_name").and_then(|v| v.as_str())
    }
}

/// Session issued by the identity service on sign-up/sign-in/refresh.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl SupabaseClient {
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.supabase_url, path)
    }

    async fn auth_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            Err(from_api_error(status, body))
        }
    }

    /// Create an account. The full name travels as user metadata; the backend
    /// mirrors it into the `profiles` row.
    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> AppResult<Session> {
        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.config.supabase_anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;

        let session: Session = self.auth_response(response).await?;
        self.session.set(session.clone()).await;
        tracing::info!(user = %session.user.id, "account created");
        Ok(session)
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        let response = self
            .http
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.config.supabase_anon_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;

        let session: Session = self.auth_response(response).await?;
        self.session.set(session.clone()).await;
        tracing::info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    /// Exchange the refresh token for a fresh session.
    pub async fn refresh_session(&self) -> AppResult<Session> {
        let current = self.session.require().await?;
        let response = self
            .http
            .post(self.auth_url("token?grant_type=refresh_token"))
            .header("apikey", &self.config.supabase_anon_key)
            .json(&json!({ "refresh_token": current.refresh_token }))
            .send()
            .await?;

        let session: Session = self.auth_response(response).await?;
        self.session.set(session.clone()).await;
        Ok(session)
    }

    /// Revoke the session on the backend and drop it locally. The local state
    /// is cleared even when the revoke call fails; from the user's side they
    /// are signed out either way.
    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(token) = self.session.access_token().await {
            let result = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.config.supabase_anon_key)
                .bearer_auth(&token)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!("logout call failed: {}", e);
            }
        }
        self.session.clear().await;
        Ok(())
    }

    /// Ask the identity service to email a password-reset link.
    pub async fn reset_password_for_email(&self, email: &str) -> AppResult<()> {
        let response = self
            .http
            .post(self.auth_url("recover"))
            .header("apikey", &self.config.supabase_anon_key)
            .query(&[("redirect_to", &self.config.password_reset_redirect)])
            .json(&json!({ "email": email }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            Err(from_api_error(status, body))
        }
    }

    /// Set a new password for the signed-in user (used after following a
    /// recovery link, and by the change-password screen).
    pub async fn update_password(&self, new_password: &str) -> AppResult<AuthUser> {
        if new_password.len() < 6 {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let session = self.session.require().await?;
        let response = self
            .http
            .put(self.auth_url("user"))
            .header("apikey", &self.config.supabase_anon_key)
            .bearer_auth(&session.access_token)
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        self.auth_response(response).await
    }

    /// Fetch the user behind the current access token.
    pub async fn current_user(&self) -> AppResult<AuthUser> {
        let session = self.session.require().await?;
        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.config.supabase_anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        self.auth_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_parses_identity_service_payload() {
        let raw = serde_json::json!({
            "access_token": "jwt-here",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-here",
            "user": {
                "id": "7f4e41fe-39ba-45b0-9a5f-4777c01b8c6e",
                "aud": "authenticated",
                "email": "ana@ufmg.br",
                "user_metadata": { "full_name": "Ana Souza" }
            }
        });

        let session: Session = serde_json::from_value(raw).unwrap();
        assert_eq!(session.user.full_name(), Some("Ana Souza"));
        assert_eq!(session.user.email.as_deref(), Some("ana@ufmg.br"));
    }

    #[tokio::test]
    async fn short_passwords_are_rejected_locally() {
        let client = SupabaseClient::new(crate::config::Config {
            supabase_url: "https://abc.supabase.co".to_string(),
            supabase_anon_key: "anon".to_string(),
            geocoding_url: String::new(),
            routing_url: String::new(),
            password_reset_redirect: String::new(),
        });

        assert!(matches!(
            client.update_password("12345").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
