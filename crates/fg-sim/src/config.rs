//! Loading [`FleetConfig`] from disk.

use std::path::Path;

use fg_core::{FgError, FleetConfig};
use tracing::debug;

use crate::SimResult;

/// Read a JSON config file.  Fields the file leaves out take their defaults.
///
/// The result has already passed [`FleetConfig::validate`].
pub fn load_config(path: impl AsRef<Path>) -> SimResult<FleetConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(FgError::from)?;
    let config: FleetConfig = serde_json::from_str(&text)
        .map_err(|e| FgError::Parse(format!("{}: {e}", path.display())))?;
    config.validate()?;
    debug!(path = %path.display(), ?config, "config loaded");
    Ok(config)
}
