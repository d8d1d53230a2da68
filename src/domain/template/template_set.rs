//! Notification body templates

use std::collections::{BTreeSet, HashMap};
use std::error::Error as _;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tera::{Context, Tera};

use crate::domain::error::{RenderError, TemplateError};
use crate::domain::event::EventData;

/// Name of the mandatory fallback template
pub const DEFAULT_TEMPLATE: &str = "default";

/// Templates shipped with the crate
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (DEFAULT_TEMPLATE, include_str!("../../../templates/default")),
    ("minion_start", include_str!("../../../templates/minion_start")),
    ("job_return", include_str!("../../../templates/job_return")),
];

/// Immutable set of named templates.
///
/// Placeholders use Tera syntax: `{{ field }}` for a top-level key and
/// `{{ a.b.c }}` for nested data. A `default` template always exists and
/// stands in for any name that is not in the set.
///
/// Tera prints maps as `[object]`, so templates pipe structured fields
/// through the `display` filter: strings stay bare and anything else is
/// written as JSON (`display(pretty=true)` indents it).
pub struct TemplateSet {
    tera: Tera,
    names: BTreeSet<String>,
}

impl TemplateSet {
    /// Build the set shipped with the crate
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::from_templates(BUILTIN_TEMPLATES.iter().copied())
    }

    /// Build a set from `(name, body)` pairs
    pub fn from_templates<I, N, B>(templates: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: AsRef<str>,
    {
        let mut tera = new_tera();
        let mut names = BTreeSet::new();

        for (name, body) in templates {
            let name = name.as_ref();
            tera.add_raw_template(name, trim_body(body.as_ref()))
                .map_err(|e| TemplateError::Invalid {
                    name: name.to_string(),
                    message: error_chain(&e),
                })?;
            names.insert(name.to_string());
        }

        if !names.contains(DEFAULT_TEMPLATE) {
            return Err(TemplateError::MissingDefault(None));
        }

        Ok(Self { tera, names })
    }

    /// Load every regular file in `dir` as a template named after its file stem
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let entries = fs::read_dir(dir).map_err(|source| TemplateError::UnreadableDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut templates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TemplateError::UnreadableDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.is_empty() || name.starts_with('.') {
                continue;
            }
            let body = fs::read_to_string(&path).map_err(|source| {
                TemplateError::UnreadableTemplate {
                    path: path.clone(),
                    source,
                }
            })?;
            templates.push((name.to_string(), body));
        }

        Self::from_templates(templates).map_err(|e| match e {
            TemplateError::MissingDefault(_) => TemplateError::MissingDefault(Some(dir.to_path_buf())),
            other => other,
        })
    }

    /// Whether a template with this exact name exists
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Template names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// The template that will be used for `name`
    pub fn resolve<'a>(&self, name: &'a str) -> &'a str {
        if self.contains(name) {
            name
        } else {
            DEFAULT_TEMPLATE
        }
    }

    /// Render the named template, falling back to `default` for unknown names
    pub fn render(&self, name: &str, data: &EventData) -> Result<String, RenderError> {
        let template = self.resolve(name);
        let context = build_context(template, data)?;
        self.tera
            .render(template, &context)
            .map_err(|e| RenderError {
                template: template.to_string(),
                message: error_chain(&e),
            })
    }

    /// Render an ad-hoc pattern, such as a callback URL, against event data
    pub fn render_str(&self, source: &str, data: &EventData) -> Result<String, RenderError> {
        let context = build_context(source, data)?;
        new_tera().render_str(source, &context).map_err(|e| RenderError {
            template: source.to_string(),
            message: error_chain(&e),
        })
    }
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("names", &self.names)
            .finish()
    }
}

fn new_tera() -> Tera {
    let mut tera = Tera::default();
    tera.register_filter("display", display);
    tera
}

fn display(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let pretty = args.get("pretty").and_then(Value::as_bool).unwrap_or(false);
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) if pretty => serde_json::to_string_pretty(value)
            .map_err(|e| tera::Error::msg(e.to_string()))?,
        other => serde_json::to_string(other).map_err(|e| tera::Error::msg(e.to_string()))?,
    };
    Ok(Value::String(text))
}

fn build_context(template: &str, data: &EventData) -> Result<Context, RenderError> {
    Context::from_serialize(data).map_err(|e| RenderError {
        template: template.to_string(),
        message: error_chain(&e),
    })
}

/// Template files usually end with a newline that is not part of the body
fn trim_body(body: &str) -> &str {
    body.trim_end_matches(['\r', '\n'])
}

/// Tera nests the useful detail in the error source chain
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
