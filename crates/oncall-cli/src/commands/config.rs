//! Configuration commands.

use std::io::Write;
use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dumps the effective configuration as TOML.
pub fn dump(config: &ClientConfig, path: &Path, out: &mut impl Write) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {e}")))?;
    writeln!(out, "# config.toml ({})", path.display())?;
    writeln!(out, "{toml_str}")?;
    Ok(())
}

/// Validates the configuration, resolving credentials when present.
pub fn validate(config: &ClientConfig, out: &mut impl Write) -> ClientResult<()> {
    config.oncall.validate()?;

    #[cfg(feature = "google")]
    if let Some(ref google) = config.google {
        google.to_provider_config()?;
        writeln!(out, "Google credentials are valid.")?;
    }

    writeln!(out, "Configuration is valid.")?;
    Ok(())
}

/// Shows the configuration file path.
pub fn path(path: &Path, out: &mut impl Write) -> ClientResult<()> {
    writeln!(out, "config: {}", path.display())?;
    Ok(())
}
