//! Credential loading from the process environment and a private `.env` file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

/// Runtime credentials keyed by environment variable name.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Snapshot of the current process environment.
    pub fn from_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Returns a credential value for a key, if present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Returns a required credential or an error when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is absent or empty.
    pub fn require(&self, key: &str) -> anyhow::Result<String> {
        self.get(key)
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("missing required credential: {key}"))
    }

    /// Overlay another set of credentials; `other` wins on conflicts.
    pub fn merge(mut self, other: Credentials) -> Self {
        self.vars.extend(other.vars);
        self
    }
}

/// Load credentials from a specific `.env` path.
///
/// # Errors
///
/// Returns an error if the file does not exist, permissions are too broad,
/// or parsing fails.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "credentials file does not exist: {}",
            path.display()
        ));
    }

    validate_private_permissions(path)?;

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read credentials at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in credentials file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    Ok(Credentials { vars })
}

/// Process environment, overlaid with `env_file` when it exists.
///
/// # Errors
///
/// Returns an error when the file exists but is invalid.
pub fn load_with_env(env_file: &Path) -> anyhow::Result<Credentials> {
    let env = Credentials::from_env();
    if !env_file.exists() {
        debug!(path = %env_file.display(), "no credentials file, using process environment");
        return Ok(env);
    }
    Ok(env.merge(load_credentials(env_file)?))
}

#[cfg(unix)]
fn validate_private_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to inspect credentials file {}", path.display()))?;
    let mode = metadata.permissions().mode() & 0o777;

    if mode & 0o077 != 0 {
        return Err(anyhow::anyhow!(
            "credentials file {} must be 0600, found {:o}",
            path.display(),
            mode
        ));
    }

    Ok(())
}

#[cfg(not(unix))]
fn validate_private_permissions(path: &Path) -> anyhow::Result<()> {
    fs::metadata(path)
        .with_context(|| format!("failed to inspect credentials file {}", path.display()))?;
    Ok(())
}
