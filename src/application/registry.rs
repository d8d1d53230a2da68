//! Ordered tag pattern registry

use globset::{Glob, GlobMatcher};
use thiserror::Error;

use crate::domain::notification::OTHER_CATEGORY;

/// Errors while building a registry
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Invalid tag pattern '{pattern}' for handler '{handler}': {message}")]
    InvalidPattern {
        handler: String,
        pattern: String,
        message: String,
    },
}

/// What a matched handler does with its event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAction {
    /// Render and send a notification
    Notify,
    /// Keep the registration but send nothing
    Suppress,
}

/// Static description of one event handler
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    name: String,
    pattern: String,
    matcher: GlobMatcher,
    category: String,
    template: String,
    sticky: bool,
    action: HandlerAction,
    callback: Option<String>,
}

impl HandlerDescriptor {
    /// Create a notifying handler. The template defaults to the handler name.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let pattern = pattern.into();
        let matcher = Glob::new(&pattern)
            .map_err(|e| RegistryError::InvalidPattern {
                handler: name.clone(),
                pattern: pattern.clone(),
                message: e.kind().to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            template: name.clone(),
            name,
            pattern,
            matcher,
            category: category.into(),
            sticky: false,
            action: HandlerAction::Notify,
            callback: None,
        })
    }

    /// Use a different template
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Mark notifications from this handler sticky
    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }

    /// Keep the handler registered but never notify
    pub fn suppressed(mut self) -> Self {
        self.action = HandlerAction::Suppress;
        self
    }

    /// Attach a callback URL pattern rendered against the event data
    pub fn callback(mut self, callback: Option<String>) -> Self {
        self.callback = callback;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn template_name(&self) -> &str {
        &self.template
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    pub fn action(&self) -> HandlerAction {
        self.action
    }

    pub fn callback_pattern(&self) -> Option<&str> {
        self.callback.as_deref()
    }

    /// Shell-glob match; `*` also matches across `/`
    pub fn matches(&self, tag: &str) -> bool {
        self.matcher.is_match(tag)
    }
}

/// Ordered set of handlers. The first registered pattern that matches wins.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    handlers: Vec<HandlerDescriptor>,
}

impl PatternRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; registration order is lookup order
    pub fn register(&mut self, handler: HandlerDescriptor) {
        self.handlers.push(handler);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, handler: HandlerDescriptor) -> Self {
        self.register(handler);
        self
    }

    /// First handler whose pattern matches `tag`
    pub fn lookup(&self, tag: &str) -> Option<&HandlerDescriptor> {
        self.handlers.iter().find(|h| h.matches(tag))
    }

    /// Handlers in registration order
    pub fn handlers(&self) -> &[HandlerDescriptor] {
        &self.handlers
    }

    /// Every category to declare at registration: the catch-all `Other`
    /// followed by each handler's category, first occurrence kept.
    pub fn categories(&self) -> Vec<String> {
        let mut categories = vec![OTHER_CATEGORY.to_string()];
        for handler in &self.handlers {
            if !categories.iter().any(|c| c == handler.category()) {
                categories.push(handler.category().to_string());
            }
        }
        categories
    }
}
