//! Google provider implementation.
//!
//! This module implements the [`OnCallProvider`] trait on top of the Calendar
//! API (shift events) and the People API (contacts).

use tokio::sync::RwLock as TokioRwLock;
use tracing::{debug, info, warn};

use crate::contact::ContactRecord;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarInfo, OnCallProvider};
use crate::raw_event::RawEvent;

use super::client::{GoogleApiClient, calendar_id_from};
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenStorage;

const PROVIDER_NAME: &str = "google";

/// Google provider.
///
/// Handles authentication via the OAuth 2.0 PKCE flow and refreshes expired
/// access tokens before each request.
pub struct GoogleProvider {
    config: GoogleConfig,
    token_storage: TokenStorage,
    oauth_client: OAuthClient,
    /// API client wrapped in tokio RwLock for async access
    api_client: TokioRwLock<Option<GoogleApiClient>>,
}

impl GoogleProvider {
    /// Creates a new Google provider with the given configuration.
    ///
    /// This loads any existing tokens from storage but does not
    /// initiate authentication. Call [`GoogleProvider::authenticate`] if needed.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let token_storage = TokenStorage::new(&config.token_path);
        if let Err(e) = token_storage.load() {
            warn!("ignoring unreadable token file: {}", e);
        }

        let oauth_client = OAuthClient::new(config.credentials.clone(), config.timeout)?;

        let api_client = match token_storage.get() {
            Some(tokens) if !tokens.is_expired() => Some(GoogleApiClient::new(
                &tokens.access_token,
                config.timeout,
                &config.user_agent,
            )?),
            _ => None,
        };

        Ok(Self {
            config,
            token_storage,
            oauth_client,
            api_client: TokioRwLock::new(api_client),
        })
    }

    /// Returns the configuration this provider was built from.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Runs the interactive OAuth flow and stores the tokens.
    ///
    /// This opens the user's browser to Google's consent page.
    pub async fn authenticate(&self) -> ProviderResult<()> {
        let tokens = self
            .oauth_client
            .authorize(
                &self.config.scopes,
                self.config.loopback_port_range,
                &self.config.display_name,
            )
            .await?;

        self.token_storage.set(tokens.clone())?;

        let client = self.new_client(&tokens.access_token)?;
        *self.api_client.write().await = Some(client);

        info!(path = %self.token_storage.path().display(), "authentication successful");
        Ok(())
    }

    /// Checks if re-authentication is needed (no tokens or missing scopes).
    pub fn needs_reauth(&self) -> bool {
        self.token_storage.needs_reauth(&self.config.scopes)
    }

    /// Removes stored tokens.
    pub async fn logout(&self) -> ProviderResult<()> {
        *self.api_client.write().await = None;
        self.token_storage.clear()
    }

    fn new_client(&self, access_token: &str) -> ProviderResult<GoogleApiClient> {
        GoogleApiClient::new(access_token, self.config.timeout, &self.config.user_agent)
    }

    /// Ensures we have an API client with a usable access token.
    async fn ensure_client(&self) -> ProviderResult<()> {
        let tokens = self.token_storage.get().ok_or_else(|| {
            ProviderError::authentication("not authenticated - run 'oncall auth'")
                .with_provider(PROVIDER_NAME)
        })?;

        if tokens.is_expired() {
            let refresh_token = tokens.refresh_token.as_ref().ok_or_else(|| {
                ProviderError::authentication("no refresh token - run 'oncall auth'")
                    .with_provider(PROVIDER_NAME)
            })?;

            debug!("refreshing expired access token");
            let (access_token, expires_in) =
                self.oauth_client.refresh_token(refresh_token).await?;
            self.token_storage
                .update_access_token(&access_token, expires_in)?;

            let mut client = self.api_client.write().await;
            match client.as_mut() {
                Some(c) => c.set_access_token(&access_token),
                None => *client = Some(self.new_client(&access_token)?),
            }
            return Ok(());
        }

        let mut client = self.api_client.write().await;
        if client.is_none() {
            *client = Some(self.new_client(&tokens.access_token)?);
        }
        Ok(())
    }

    async fn list_events_impl(&self, calendar: &str) -> ProviderResult<Vec<RawEvent>> {
        let calendar_id = calendar_id_from(calendar)?;
        self.ensure_client().await?;

        let client = self.api_client.read().await;
        let client = client
            .as_ref()
            .ok_or_else(|| ProviderError::internal("API client not available"))?;
        client.list_events(&calendar_id).await
    }

    async fn search_contacts_impl(&self, query: &str) -> ProviderResult<Vec<ContactRecord>> {
        self.ensure_client().await?;

        let client = self.api_client.read().await;
        let client = client
            .as_ref()
            .ok_or_else(|| ProviderError::internal("API client not available"))?;
        client.search_contacts(query).await
    }

    async fn list_calendars_impl(&self) -> ProviderResult<Vec<CalendarInfo>> {
        self.ensure_client().await?;

        let client = self.api_client.read().await;
        let client = client
            .as_ref()
            .ok_or_else(|| ProviderError::internal("API client not available"))?;

        let calendars = client.list_calendars().await?;

        Ok(calendars
            .into_iter()
            .map(|c| {
                let mut info = CalendarInfo::new(&c.id, &c.summary).with_primary(c.primary);
                if let Some(tz) = c.time_zone {
                    info = info.with_timezone(tz);
                }
                info.description = c.description;
                info
            })
            .collect())
    }
}

fn tag<T>(result: ProviderResult<T>) -> ProviderResult<T> {
    result.map_err(|e| match e.provider() {
        Some(_) => e,
        None => e.with_provider(PROVIDER_NAME),
    })
}

impl OnCallProvider for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_events<'a>(
        &'a self,
        calendar: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move { tag(self.list_events_impl(calendar).await) })
    }

    fn search_contacts<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>> {
        Box::pin(async move { tag(self.search_contacts_impl(query).await) })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        Box::pin(async move { tag(self.list_calendars_impl().await) })
    }

    fn is_authenticated(&self) -> bool {
        // Valid tokens, or expired ones we can refresh.
        self.token_storage
            .get()
            .is_some_and(|tokens| !tokens.is_expired() || tokens.refresh_token.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::google::config::OAuthCredentials;
    use crate::google::tokens::TokenInfo;

    fn test_config(dir: &tempfile::TempDir) -> GoogleConfig {
        let credentials =
            OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret");
        GoogleConfig::new(credentials).with_token_path(dir.path().join("tokens.json"))
    }

    #[test]
    fn provider_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = GoogleProvider::new(test_config(&tmp)).unwrap();
        assert_eq!(provider.name(), "google");
        assert!(!provider.is_authenticated());
        assert!(provider.needs_reauth());
    }

    #[test]
    fn provider_rejects_invalid_config() {
        let credentials = OAuthCredentials::new("not-a-client-id", "secret");
        let err = GoogleProvider::new(GoogleConfig::new(credentials)).err().unwrap();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }

    #[test]
    fn provider_authenticated_with_stored_tokens() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(&tmp);
        TokenStorage::new(&config.token_path)
            .set(TokenInfo::new(
                "access",
                Some("refresh".into()),
                Some(3600),
                config.scopes.clone(),
            ))
            .unwrap();

        let provider = GoogleProvider::new(config).unwrap();
        assert!(provider.is_authenticated());
        assert!(!provider.needs_reauth());
    }

    #[tokio::test]
    async fn list_events_without_tokens_fails_authentication() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = GoogleProvider::new(test_config(&tmp)).unwrap();

        let err = provider.list_events("primary").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("google"));
    }

    #[tokio::test]
    async fn list_events_rejects_bad_calendar_url() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = GoogleProvider::new(test_config(&tmp)).unwrap();

        let err = provider
            .list_events("https://example.com/not-a-calendar")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn logout_clears_tokens() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(&tmp);
        let token_path = config.token_path.clone();
        TokenStorage::new(&token_path)
            .set(TokenInfo::new("access", None, None, vec![]))
            .unwrap();

        let provider = GoogleProvider::new(config).unwrap();
        assert!(provider.is_authenticated());
        provider.logout().await.unwrap();
        assert!(!provider.is_authenticated());
        assert!(!token_path.exists());
    }
}
