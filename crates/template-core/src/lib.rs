//! Template tokenizing for bindery magic text.
//!
//! Templates mix literal text with `{{path}}`, `{{path|format:args}}` and
//! `{{formula:...}}` expressions. Parsing is permissive and pure, so parsed
//! templates can be shared through a [`TemplateCache`].

pub mod cache;
pub mod template;

pub use cache::{DEFAULT_CACHE_CAPACITY, TemplateCache};
pub use template::{CLOSE, OPEN, Template, Token, parse_template};
