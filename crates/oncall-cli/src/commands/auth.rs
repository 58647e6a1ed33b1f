//! Account commands: `auth` and `calendars`.

use std::io::Write;

use oncall_providers::OnCallProvider;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Runs the Google OAuth flow.
///
/// Does nothing when stored tokens already cover the required scopes, unless
/// `force` is set.
#[cfg(feature = "google")]
pub async fn google(config: &ClientConfig, force: bool, out: &mut impl Write) -> ClientResult<()> {
    let provider = super::google_provider(config)?;

    if !provider.needs_reauth() && !force {
        writeln!(out, "Already authenticated with Google.")?;
        writeln!(out, "Use --force to re-authenticate.")?;
        return Ok(());
    }

    writeln!(out, "Starting Google authentication...")?;
    writeln!(out)?;
    writeln!(out, "A browser window will open for you to authorize access.")?;
    writeln!(
        out,
        "If the browser doesn't open, check the terminal for a URL to copy."
    )?;
    writeln!(out)?;
    out.flush()?;

    provider.authenticate().await?;

    info!("Google authentication successful");
    writeln!(out, "Authentication successful!")?;
    writeln!(
        out,
        "Tokens saved to {}",
        provider.config().token_path.display()
    )?;
    Ok(())
}

#[cfg(not(feature = "google"))]
pub async fn google(config: &ClientConfig, force: bool, out: &mut impl Write) -> ClientResult<()> {
    let _ = (config, force, out);
    Err(crate::error::ClientError::Config(
        "built without Google support".to_string(),
    ))
}

/// Lists the calendars the account can read.
pub async fn calendars(config: &ClientConfig, out: &mut impl Write) -> ClientResult<()> {
    let provider = super::provider(config)?;
    let calendars = provider.list_calendars().await?;
    info!(count = calendars.len(), "listed calendars");
    super::write_calendars(out, &calendars)
}

#[cfg(all(test, feature = "google"))]
mod tests {
    use super::*;
    use crate::config::GoogleSettings;
    use crate::error::EX_CONFIG;

    fn config(dir: &tempfile::TempDir) -> ClientConfig {
        ClientConfig {
            google: Some(GoogleSettings {
                client_id: Some("test.apps.googleusercontent.com".to_string()),
                client_secret: Some("test-secret".to_string()),
                token_path: Some(dir.path().join("tokens.json")),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn auth_without_credentials_is_config_error() {
        let mut out = Vec::new();
        let err = google(&ClientConfig::default(), false, &mut out)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), EX_CONFIG);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn calendars_without_tokens_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let err = calendars(&config(&tmp), &mut out).await.unwrap_err();
        assert_eq!(err.exit_code(), EX_CONFIG);
    }
}
