//! Console session state machine.
//!
//! `initialize()` rehydrates from the vault and resolves to Authenticated
//! or Unauthenticated, never an error: a missing token, an expired session
//! or any whoami failure all land in Unauthenticated. The whoami endpoint
//! is chosen solely by the stored role marker.

use crate::auth::profile::Profile;
use crate::auth::service::IssuedSession;
use crate::auth::Role;
use crate::console::vault::TokenVault;
use crate::console::ConsoleError;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Uninitialized,
    Loading,
    Authenticated { role: Role, profile: Profile },
    Unauthenticated,
}

pub struct SessionClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) vault: TokenVault,
    state: AuthState,
}

impl SessionClient {
    pub fn new(base_url: impl Into<String>, vault: TokenVault) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            vault,
            state: AuthState::Uninitialized,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub(crate) fn bearer_token(&self) -> Option<String> {
        self.vault.load().map(|r| r.access_token)
    }

    /// Rehydrate the session from the vault. Infallible by contract.
    pub async fn initialize(&mut self) {
        self.state = AuthState::Loading;
        self.state = match self.rehydrate().await {
            Some((role, profile)) => AuthState::Authenticated { role, profile },
            None => AuthState::Unauthenticated,
        };
    }

    async fn rehydrate(&self) -> Option<(Role, Profile)> {
        let record = self.vault.load()?;
        let role = match Role::from_marker(&record.role_marker) {
            Ok(role) => role,
            Err(_) => {
                tracing::warn!(marker = %record.role_marker, "unknown role marker in vault");
                return None;
            }
        };

        let url = format!("{}{}", self.base_url, role.whoami_path());
        let response = self
            .http
            .get(&url)
            .bearer_auth(&record.access_token)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let profile = response.json::<Profile>().await.ok()?;
        Some((role, profile))
    }

    /// Sign in at one of the four portals.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        portal: Role,
    ) -> Result<Profile, ConsoleError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ConsoleError::Validation(
                "email and password are required".into(),
            ));
        }

        let (path, body) = match portal {
            Role::Doctor => (
                "/doctors-login",
                serde_json::json!({ "email": email, "password": password }),
            ),
            other => (
                "/login",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "portal": other,
                }),
            ),
        };

        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::UNAUTHORIZED => return Err(ConsoleError::InvalidCredentials),
            reqwest::StatusCode::FORBIDDEN => return Err(ConsoleError::PermissionDenied),
            s => return Err(ConsoleError::NetworkOrServer(format!("status {s}"))),
        }

        let issued = response.json::<IssuedSession>().await?;
        self.vault.store(&issued.access_token, issued.role)?;
        self.state = AuthState::Authenticated {
            role: issued.role,
            profile: issued.user.clone(),
        };
        Ok(issued.user)
    }

    /// Sign out: best-effort server revocation, then the vault is cleared
    /// regardless. Idempotent.
    pub async fn logout(&mut self) {
        if let Some(token) = self.bearer_token() {
            let url = format!("{}/logout", self.base_url);
            if let Err(e) = self.http.post(&url).bearer_auth(&token).send().await {
                tracing::warn!("logout request failed: {e}");
            }
        }
        if let Err(e) = self.vault.clear() {
            tracing::warn!("failed to clear token vault: {e}");
        }
        self.state = AuthState::Unauthenticated;
    }
}
