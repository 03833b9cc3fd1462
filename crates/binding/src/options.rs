use bindery_format::Locale;

/// Row cap for repeaters that do not declare `maxItems`.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Options that shape one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub max_items: usize,
    pub locale: Locale,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            locale: Locale::default(),
        }
    }
}
