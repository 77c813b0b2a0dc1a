//! Bodies of the generated category descriptors and documents.
//!
//! Built-in defaults can be replaced per file from a template directory.
//! JSON templates keep their own fields; `label` and `position` are always
//! overwritten and `{label}` inside string values is substituted. Markdown
//! templates use the placeholders `{title}`, `{position}`, `{description}`,
//! `{usage}` and `{label}`; any other brace text is left alone so MDX
//! content survives.

use std::io;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::error::{CmdtreeError, FsOperation, Result};

/// Template file overriding the plain category descriptor.
pub const CATEGORY_TEMPLATE: &str = "_category_.json";
/// Template file overriding the linked descriptor used on label conflicts.
pub const CONFLICTING_CATEGORY_TEMPLATE: &str = "_category_conflict.json";
/// Template file overriding the category index document.
pub const CATEGORY_INDEX_TEMPLATE: &str = "category.md";
/// Template file overriding the command document.
pub const DOCUMENT_TEMPLATE: &str = "command.md";

/// Base name of the index document written next to a linked descriptor.
pub const CATEGORY_INDEX_STEM: &str = "category";

const DEFAULT_CATEGORY_INDEX: &str = "\
---
sidebar_position: {position}
---

{description}

import DocCardList from '@theme/DocCardList';

<DocCardList />
";

const DEFAULT_DOCUMENT: &str = "\
---
sidebar_position: {position}
---

# {title}

Overview: {description}

Parameters:
```bash
```

Example:
```bash
{usage}
```

Output:
```bash
```
";

const PLACEHOLDERS: [&str; 5] = ["title", "position", "description", "usage", "label"];

/// The set of templates used for one run.
///
/// # Examples
/// ```
/// use camino::Utf8Path;
/// use cmdtree_core::Templates;
///
/// let templates = Templates::default();
/// let usage = vec!["acli log get".to_owned()];
/// let body = templates.document(Utf8Path::new("log/get"), 1, &usage);
/// assert!(body.contains("# get"));
/// assert!(body.contains("acli log get"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Templates {
    category: Map<String, Value>,
    conflicting_category: Map<String, Value>,
    category_index: String,
    document: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            category: object(json!({
                "label": "{label}",
                "position": 1,
                "link": {
                    "type": "generated-index",
                    "description": "{label} commands",
                },
            })),
            conflicting_category: object(json!({
                "label": "{label}",
                "position": 1,
                "link": { "type": "doc", "id": "" },
            })),
            category_index: DEFAULT_CATEGORY_INDEX.to_owned(),
            document: DEFAULT_DOCUMENT.to_owned(),
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl Templates {
    /// Loads overrides from `dir`, falling back to the defaults for missing files.
    ///
    /// # Errors
    /// Returns [`CmdtreeError::Filesystem`] when the directory or a template
    /// cannot be read, and [`CmdtreeError::InvalidTemplate`] when a JSON
    /// template is not an object or a Markdown template is not UTF-8.
    #[instrument(name = "core.templates.load", err)]
    pub fn load(dir: &Utf8Path) -> Result<Self> {
        let handle = Dir::open_ambient_dir(dir, ambient_authority())
            .map_err(|source| CmdtreeError::filesystem(FsOperation::ReadTemplate, dir, source))?;
        let mut templates = Self::default();

        if let Some(raw) = read_optional(&handle, dir, CATEGORY_TEMPLATE)? {
            templates.category = parse_descriptor(dir, CATEGORY_TEMPLATE, &raw)?;
        }
        if let Some(raw) = read_optional(&handle, dir, CONFLICTING_CATEGORY_TEMPLATE)? {
            let descriptor = parse_descriptor(dir, CONFLICTING_CATEGORY_TEMPLATE, &raw)?;
            if descriptor.get("link").is_some_and(|link| !link.is_object()) {
                return Err(invalid(
                    dir,
                    CONFLICTING_CATEGORY_TEMPLATE,
                    "`link` must be an object",
                ));
            }
            templates.conflicting_category = descriptor;
        }
        if let Some(raw) = read_optional(&handle, dir, CATEGORY_INDEX_TEMPLATE)? {
            templates.category_index = raw;
        }
        if let Some(raw) = read_optional(&handle, dir, DOCUMENT_TEMPLATE)? {
            templates.document = raw;
        }
        Ok(templates)
    }

    /// Renders the descriptor of a directory.
    #[must_use]
    pub fn category(&self, label: &str, position: usize) -> String {
        render_descriptor(self.category.clone(), label, position)
    }

    /// Renders the linked descriptor of a directory whose label is taken.
    ///
    /// The link points at `index`, the document id of the category index
    /// written next to the descriptor.
    #[must_use]
    pub fn conflicting_category(&self, label: &str, position: usize, index: &Utf8Path) -> String {
        let mut descriptor = self.conflicting_category.clone();
        let id = index.to_string();
        match descriptor.get_mut("link") {
            Some(Value::Object(link)) => {
                link.insert("id".to_owned(), Value::String(id));
            }
            _ => {
                descriptor.insert("link".to_owned(), json!({ "type": "doc", "id": id }));
            }
        }
        render_descriptor(descriptor, label, position)
    }

    /// Renders the index document written next to a linked descriptor.
    #[must_use]
    pub fn category_index(&self, dir: &Utf8Path, position: usize) -> String {
        let label = dir.file_name().unwrap_or_default();
        let description = format!("Commands under {}.", breadcrumb(dir));
        fill(
            &self.category_index,
            &Values {
                title: label,
                position,
                description: &description,
                usage: "",
                label,
            },
        )
    }

    /// Renders the document of the leaf at `node_path`.
    ///
    /// `usage` lists the commands the document covers, one per line.
    #[must_use]
    pub fn document(&self, node_path: &Utf8Path, position: usize, usage: &[String]) -> String {
        let title = node_path.file_name().unwrap_or_default();
        let description = breadcrumb(node_path);
        let usage = usage.join("\n");
        fill(
            &self.document,
            &Values {
                title,
                position,
                description: &description,
                usage: &usage,
                label: title,
            },
        )
    }
}

fn read_optional(handle: &Dir, dir: &Utf8Path, name: &str) -> Result<Option<String>> {
    match handle.read_to_string(name) {
        Ok(raw) => {
            debug!(template = name, "loaded template override");
            Ok(Some(raw))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) if err.kind() == io::ErrorKind::InvalidData => {
            Err(invalid(dir, name, "file is not valid UTF-8"))
        }
        Err(err) => Err(CmdtreeError::filesystem(
            FsOperation::ReadTemplate,
            dir.join(name),
            err,
        )),
    }
}

fn parse_descriptor(dir: &Utf8Path, name: &str, raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid(dir, name, "expected a JSON object")),
        Err(err) => Err(invalid(dir, name, &err.to_string())),
    }
}

fn invalid(dir: &Utf8Path, name: &str, reason: &str) -> CmdtreeError {
    CmdtreeError::InvalidTemplate {
        path: dir.join(name),
        reason: reason.to_owned(),
    }
}

fn render_descriptor(mut descriptor: Map<String, Value>, label: &str, position: usize) -> String {
    for value in descriptor.values_mut() {
        substitute_label(value, label);
    }
    descriptor.insert("label".to_owned(), Value::String(label.to_owned()));
    descriptor.insert("position".to_owned(), Value::from(position));
    format!("{:#}\n", Value::Object(descriptor))
}

fn substitute_label(value: &mut Value, label: &str) {
    match value {
        Value::String(text) if text.contains("{label}") => {
            *text = text.replace("{label}", label);
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| substitute_label(item, label)),
        Value::Object(map) => map
            .values_mut()
            .for_each(|item| substitute_label(item, label)),
        _ => {}
    }
}

fn breadcrumb(path: &Utf8Path) -> String {
    path.iter().collect::<Vec<_>>().join(" > ")
}

struct Values<'a> {
    title: &'a str,
    position: usize,
    description: &'a str,
    usage: &'a str,
    label: &'a str,
}

impl Values<'_> {
    fn lookup(&self, name: &str) -> Option<String> {
        Some(match name {
            "title" => self.title.to_owned(),
            "position" => self.position.to_string(),
            "description" => self.description.to_owned(),
            "usage" => self.usage.to_owned(),
            "label" => self.label.to_owned(),
            _ => return None,
        })
    }
}

/// Substitutes known placeholders in one pass, so values are never rescanned.
fn fill(template: &str, values: &Values<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let (before, from_brace) = rest.split_at(open);
        out.push_str(before);
        let known = from_brace.find('}').and_then(|close| {
            let name = from_brace.get(1..close)?;
            PLACEHOLDERS
                .contains(&name)
                .then(|| values.lookup(name))
                .flatten()
                .map(|value| (value, close))
        });
        match known {
            Some((value, close)) => {
                out.push_str(&value);
                rest = from_brace.get(close + 1..).unwrap_or_default();
            }
            None => {
                out.push('{');
                rest = from_brace.get(1..).unwrap_or_default();
            }
        }
    }
    out.push_str(rest);
    out
}
