//! Notification value objects

use std::collections::BTreeSet;

use crate::domain::error::UndeclaredCategory;

/// Catch-all category every registration declares
pub const OTHER_CATEGORY: &str = "Other";

/// Application registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub app_name: String,
    pub icon: Option<String>,
    /// Declared categories, in declaration order
    pub categories: Vec<String>,
}

impl Registration {
    /// Create a registration, dropping duplicate categories but keeping order
    pub fn new<I, S>(app_name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let categories = categories
            .into_iter()
            .map(Into::into)
            .filter(|c: &String| seen.insert(c.clone()))
            .collect();
        Self {
            app_name: app_name.into(),
            icon: None,
            categories,
        }
    }

    /// Set the application icon URL
    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }

    /// The session a successful registration of this request yields
    pub fn into_session(self) -> NotifierSession {
        NotifierSession {
            app_name: self.app_name,
            icon: self.icon,
            categories: self.categories.into_iter().collect(),
        }
    }
}

/// A registered application.
///
/// Created once before any notify call and reused for the whole process
/// lifetime; notifications may only reference categories declared here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierSession {
    app_name: String,
    icon: Option<String>,
    categories: BTreeSet<String>,
}

impl NotifierSession {
    /// Registered application name
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Registered icon URL
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Whether a category was declared at registration
    pub fn declares(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    /// Declared categories in sorted order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Fail unless `category` was declared at registration
    pub fn ensure_declared(&self, category: &str) -> Result<(), UndeclaredCategory> {
        if self.declares(category) {
            Ok(())
        } else {
            Err(UndeclaredCategory {
                category: category.to_string(),
            })
        }
    }
}

/// Delivery options for a single notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyOptions {
    /// The receiver should not auto-dismiss
    pub sticky: bool,
    /// Clickable follow-up URL
    pub callback: Option<String>,
    /// Coalescing key; later notifications with the same key replace earlier ones
    pub identifier: Option<String>,
}

/// A single outbound notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub category: String,
    pub title: String,
    pub body: String,
    pub options: NotifyOptions,
}

impl Notification {
    /// Create a notification with default options
    pub fn new(
        category: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
            body: body.into(),
            options: NotifyOptions::default(),
        }
    }

    /// Replace the delivery options
    pub fn with_options(mut self, options: NotifyOptions) -> Self {
        self.options = options;
        self
    }
}
