//! Front matter extraction and the merged template view.
//!
//! A document may start with a metadata header:
//!
//! ```text
//! ---                 +++
//! title: Hello        title = "Hello"
//! ---                 +++
//! Body text           Body text
//! ```
//!
//! `---` opens YAML unless a language follows it (`---toml`, `---json`,
//! `---yaml`, `---yml`); `+++` opens TOML. The header must be closed by the
//! same bare delimiter on its own line.
//!
//! The merged view is the header's keys plus [`GLOBALS_KEY`] bound to the
//! global namespace. The namespace always wins for that key.

use super::error::{FormatError, FrontMatterError};
use super::value;
use serde_json::{Map, Value};

/// Reserved key under which the global namespace is exposed.
pub const GLOBALS_KEY: &str = "globals";

const UTF8_BOM: char = '\u{feff}';

/// Header language, selected by the opening delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lang {
    Yaml,
    Toml,
    Json,
}

/// A document split into its header object and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    pub data: Map<String, Value>,
    pub body: &'a str,
}

/// Result of merging a document with the global namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// Document text without its header
    pub body: String,
    /// Header keys exactly as written in the document
    pub front_matter: Map<String, Value>,
    /// Header keys plus `globals`
    pub view: Map<String, Value>,
}

/// Split `content` into header data and body.
///
/// Content without a header yields an empty object and the content itself.
pub fn parse(content: &str) -> Result<Document<'_>, FrontMatterError> {
    let text = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (text, None),
    };
    let Some((lang, closer)) = opening(first.trim_end()) else {
        return Ok(Document {
            data: Map::new(),
            body: content,
        });
    };
    let rest = rest.ok_or(FrontMatterError::Unterminated(closer))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == closer {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Document {
                data: parse_header(header, lang)?,
                body,
            });
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated(closer))
}

/// Merge a document's front matter with the global namespace.
///
/// Neither `content` nor `namespace` is modified; the view owns copies.
pub fn merge(content: &str, namespace: &Value) -> Result<Merged, FrontMatterError> {
    let Document { data, body } = parse(content)?;

    let mut view = data.clone();
    view.insert(GLOBALS_KEY.to_owned(), namespace.clone());

    Ok(Merged {
        body: body.to_owned(),
        front_matter: data,
        view,
    })
}

/// Recognize an opening delimiter line, returning its language and closer.
fn opening(line: &str) -> Option<(Lang, &'static str)> {
    match line {
        "+++" => Some((Lang::Toml, "+++")),
        "---" | "---yaml" | "---yml" => Some((Lang::Yaml, "---")),
        "---toml" => Some((Lang::Toml, "---")),
        "---json" => Some((Lang::Json, "---")),
        _ => None,
    }
}

fn parse_header(header: &str, lang: Lang) -> Result<Map<String, Value>, FrontMatterError> {
    if header.trim().is_empty() {
        return Ok(Map::new());
    }

    let syntax = |err: FormatError| FrontMatterError::Syntax(Box::new(err));
    let parsed = match lang {
        Lang::Yaml => serde_yaml::from_str(header)
            .map(value::from_yaml)
            .map_err(|e| syntax(e.into()))?,
        Lang::Toml => toml::from_str(header)
            .map(value::from_toml_table)
            .map_err(|e| syntax(e.into()))?,
        Lang::Json => serde_json::from_str(header).map_err(|e| syntax(e.into()))?,
    };

    match parsed {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(FrontMatterError::NotAMapping(value::kind_name(&other))),
    }
}
