// src/engine.rs
use crate::config::EngineConfig;
use crate::error::BinderyError;
use crate::page::Page;
use bindery_binding::Renderer;
use bindery_jpath::{Context, EvaluationContext};
use bindery_template_core::{Template, TemplateCache};
use bindery_traits::{CollectionProvider, SnapshotProvider};
use bindery_types::{BindingDescriptor, ComponentNode};
use serde_json::Value;
use std::sync::Arc;

/// Owns a provider, a template cache and the settings shared by every call.
///
/// Each top-level call is one render pass: with `snapshotProvider` enabled,
/// all table reads inside that call see a single memoized view.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    provider: Arc<dyn CollectionProvider>,
    cache: TemplateCache,
}

impl Engine {
    pub fn new(provider: Arc<dyn CollectionProvider>) -> Self {
        Self::with_config(provider, EngineConfig::default())
    }

    pub fn with_config(provider: Arc<dyn CollectionProvider>, config: EngineConfig) -> Self {
        log::debug!(
            "Engine over '{}' (locale {}, cache {}, max items {})",
            provider.name(),
            config.locale,
            config.template_cache_capacity,
            config.max_repeater_items
        );
        Self {
            cache: TemplateCache::new(config.template_cache_capacity),
            config,
            provider,
        }
    }

    /// Builds an engine over a page's tables.
    pub fn for_page(page: &Page, config: EngineConfig) -> Result<Self, BinderyError> {
        config.validate()?;
        Ok(Self::with_config(Arc::new(page.provider()?), config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn CollectionProvider {
        self.provider.as_ref()
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Runs `f` against the provider for one render pass.
    fn with_pass_provider<R>(&self, f: impl FnOnce(&dyn CollectionProvider) -> R) -> R {
        if self.config.snapshot_provider {
            f(&SnapshotProvider::new(self.provider.as_ref()))
        } else {
            f(self.provider.as_ref())
        }
    }

    fn with_renderer<R>(&self, f: impl FnOnce(&Renderer<'_>) -> R) -> R {
        self.with_pass_provider(|provider| {
            let renderer = Renderer::new(provider)
                .with_cache(&self.cache)
                .with_options(self.config.render_options());
            f(&renderer)
        })
    }

    /// Parses a template through the engine's cache.
    pub fn parse_template(&self, source: &str) -> Arc<Template> {
        self.cache.get_or_parse(source)
    }

    pub fn resolve_binding(&self, descriptor: &BindingDescriptor, context: &Context) -> Value {
        self.with_renderer(|r| r.resolve_binding(descriptor, context))
    }

    pub fn render_template_string(&self, source: &str, context: &Context) -> String {
        self.with_renderer(|r| r.render_template_string(source, context))
    }

    pub fn instantiate_for_row(
        &self,
        template: &ComponentNode,
        item: Value,
        index: usize,
        context: &Context,
    ) -> ComponentNode {
        self.with_renderer(|r| r.instantiate_for_row(template, item, index, context))
    }

    pub fn evaluate_formula(&self, formula: &str, context: &Context) -> Value {
        self.with_pass_provider(|provider| {
            bindery_formula::evaluate_formula(formula, &EvaluationContext::new(context, provider))
        })
    }

    pub fn render_component(&self, node: &ComponentNode, context: &Context) -> ComponentNode {
        self.with_renderer(|r| r.render_component(node, context))
    }

    /// Renders every root component of a page in one pass.
    pub fn render_components(
        &self,
        components: &[ComponentNode],
        context: &Context,
    ) -> Vec<ComponentNode> {
        self.with_renderer(|r| {
            components
                .iter()
                .map(|node| r.render_component(node, context))
                .collect()
        })
    }

    /// Renders a page document against its own state and user.
    pub fn render_page(&self, page: &Page) -> Result<Vec<ComponentNode>, BinderyError> {
        let context = page.context()?;
        Ok(self.render_components(&page.components, &context))
    }
}
