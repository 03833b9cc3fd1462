//! A shared cache of parsed templates keyed by source string.
use crate::template::{Template, parse_template};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Parsing is pure, so a cached template is always valid for its source.
/// When the cache is full it is cleared rather than evicting piecemeal.
#[derive(Debug)]
pub struct TemplateCache {
    capacity: usize,
    entries: RwLock<HashMap<String, Arc<Template>>>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TemplateCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_parse(&self, source: &str) -> Arc<Template> {
        if let Ok(entries) = self.entries.read()
            && let Some(hit) = entries.get(source)
        {
            return Arc::clone(hit);
        }

        let template = Arc::new(parse_template(source));
        if self.capacity == 0 {
            return template;
        }
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= self.capacity {
                log::debug!("Template cache full ({} entries); clearing", entries.len());
                entries.clear();
            }
            entries.insert(source.to_string(), Arc::clone(&template));
        }
        template
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}
