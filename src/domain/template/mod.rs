//! Template domain types

mod template_set;

pub use template_set::{TemplateSet, DEFAULT_TEMPLATE};
