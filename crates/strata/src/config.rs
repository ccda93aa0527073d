//! Engine configuration, loaded once at startup.

use serde::Deserialize;

use crate::error::EngineError;

/// Tunable engine parameters.
///
/// Every field has a default, so a partial TOML file (or none at all) is
/// valid. Configuration is read once before the threads spawn; nothing here
/// changes at runtime.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Update ticks per second.
    pub update_hz: f64,
    /// Node slots in the scene graph.
    pub node_capacity: usize,
    /// Render item slots per frame.
    pub render_item_capacity: usize,
    /// Completion notifications buffered before the event thread pumps.
    pub notification_capacity: usize,
    /// Render frames buffered between the update and render threads.
    pub render_queue_capacity: usize,
    /// Device memory budget in bytes for the default allocator.
    pub gpu_memory_budget: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            update_hz: 60.0,
            node_capacity: 1024,
            render_item_capacity: 1024,
            notification_capacity: 256,
            render_queue_capacity: 2,
            gpu_memory_budget: 64 << 20,
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for malformed TOML or unknown keys,
    /// and [`EngineError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges; the tick interval is derived from `update_hz`,
    /// so it must be a positive finite rate.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.update_hz.is_finite() || self.update_hz <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "update_hz must be a positive finite rate",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_all_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.update_hz, EngineConfig::default().update_hz);
        assert_eq!(config.node_capacity, 1024);
    }

    #[test]
    fn test_partial_document_overrides_named_fields() {
        let config = EngineConfig::from_toml_str(
            "update_hz = 120.0\nnode_capacity = 64\n",
        )
        .unwrap();
        assert_eq!(config.update_hz, 120.0);
        assert_eq!(config.node_capacity, 64);
        assert_eq!(config.render_queue_capacity, 2);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(EngineConfig::from_toml_str("frames = 3\n").is_err());
    }

    #[test]
    fn test_nonpositive_tick_rate_rejected() {
        for document in ["update_hz = 0.0\n", "update_hz = -30.0\n"] {
            assert!(matches!(
                EngineConfig::from_toml_str(document),
                Err(EngineError::InvalidConfig(_))
            ));
        }
    }
}
