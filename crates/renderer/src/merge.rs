//! Base rendering configuration and document merging.

use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use crate::RenderError;

/// Global defaults every layer configuration is merged over.
pub const DEFAULT_BASE_CONFIG: &str = r#"
globals:
  http:
    client_timeout: 60
  image:
    resampling_method: bilinear
    paletted: false
services:
  wms:
    srs: ['EPSG:4326', 'EPSG:3857']
    image_formats: ['image/png']
"#;

/// Parse the built-in base configuration.
pub fn default_base_config() -> Result<Value, RenderError> {
    Ok(serde_yaml::from_str(DEFAULT_BASE_CONFIG)?)
}

/// Load the base configuration from `path`, or the built-in defaults.
pub fn load_base_config(path: Option<&Path>) -> Result<Value, RenderError> {
    let Some(path) = path else {
        return default_base_config();
    };

    debug!(path = %path.display(), "Loading base rendering configuration");
    let content = std::fs::read_to_string(path).map_err(|source| RenderError::BaseConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Value = serde_yaml::from_str(&content)?;
    if !config.is_mapping() {
        return Err(RenderError::InvalidConfig(format!(
            "base configuration {} is not a mapping",
            path.display()
        )));
    }
    Ok(config)
}

/// Merge `overlay` over `base`.
///
/// Mappings merge key by key, recursively. Any other overlay value replaces the
/// base value. A null overlay leaves the base untouched.
pub fn merge_config(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => {
                        let current = std::mem::replace(existing, Value::Null);
                        *existing = merge_config(current, value);
                    }
                    None => {
                        base.insert(key, value);
                    }
                }
            }
            Value::Mapping(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}
