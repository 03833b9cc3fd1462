use crate::error::BinderyError;
use bindery_binding::{DEFAULT_MAX_ITEMS, RenderOptions};
use bindery_format::Locale;
use bindery_template_core::DEFAULT_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};

/// Engine settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Row cap for repeaters that do not set `maxItems` themselves.
    pub max_repeater_items: usize,
    /// Parsed templates kept in memory. `0` turns caching off.
    pub template_cache_capacity: usize,
    /// Locale tag used for number grouping and decimal separators.
    pub locale: String,
    /// Memoize table queries for the duration of one render pass.
    pub snapshot_provider: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_repeater_items: DEFAULT_MAX_ITEMS,
            template_cache_capacity: DEFAULT_CACHE_CAPACITY,
            locale: "en-US".to_string(),
            snapshot_provider: true,
        }
    }
}

impl EngineConfig {
    /// Parses a config document and checks its values.
    pub fn from_json(source: &str) -> Result<Self, BinderyError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BinderyError> {
        if self.max_repeater_items == 0 {
            return Err(BinderyError::Config(
                "maxRepeaterItems must be at least 1".to_string(),
            ));
        }
        if self.locale.trim().is_empty() {
            return Err(BinderyError::Config("locale must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_items: self.max_repeater_items,
            locale: Locale::parse(&self.locale),
        }
    }
}
