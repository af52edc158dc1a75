//! Split/parse/serialize for YAML (`---`) and TOML (`+++`) frontmatter
//! blocks (spec §4.1).

use crate::error::JidoError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::Scalar;

/// Which delimiter style a frontmatter block uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontmatterSyntax {
    Yaml,
    Toml,
}

impl FrontmatterSyntax {
    fn delimiter(self) -> &'static str {
        match self {
            FrontmatterSyntax::Yaml => "---",
            FrontmatterSyntax::Toml => "+++",
        }
    }
}

/// Result of splitting raw document text into frontmatter + body.
pub struct ParsedFrontmatter {
    pub syntax: Option<FrontmatterSyntax>,
    pub frontmatter: IndexMap<String, Scalar>,
    pub body: String,
}

/// Split `raw` at its leading frontmatter block (if any) and parse it.
pub fn split_and_parse(
    raw: &str,
    default_syntax: FrontmatterSyntax,
) -> Result<ParsedFrontmatter, JidoError> {
    for syntax in [FrontmatterSyntax::Yaml, FrontmatterSyntax::Toml] {
        let delim = syntax.delimiter();
        let prefix = format!("{delim}\n");
        if let Some(rest) = raw.strip_prefix(&prefix) {
            return match find_closing_delimiter(rest, delim) {
                Some((fm_text, body)) => {
                    let frontmatter = parse_frontmatter(fm_text, syntax)?;
                    Ok(ParsedFrontmatter {
                        syntax: Some(syntax),
                        frontmatter,
                        body: body.to_string(),
                    })
                }
                None => Err(JidoError::parse_failed(format!(
                    "unterminated {delim} frontmatter block"
                ))
                .with_details(serde_json::json!({ "line": 1 }))),
            };
        }
    }

    Ok(ParsedFrontmatter {
        syntax: None,
        frontmatter: IndexMap::new(),
        body: raw.to_string(),
    })
}

/// Find a line consisting solely of `delim` in `rest`, returning the text
/// before it (the frontmatter body) and the text after it (the document
/// body, with the first following newline stripped).
fn find_closing_delimiter<'a>(rest: &'a str, delim: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.strip_suffix('\n').unwrap_or(line);
        if trimmed == delim {
            let fm_text = &rest[..offset];
            let body_start = offset + line.len();
            return Some((fm_text, &rest[body_start..]));
        }
        offset += line.len();
    }
    None
}

fn parse_frontmatter(
    text: &str,
    syntax: FrontmatterSyntax,
) -> Result<IndexMap<String, Scalar>, JidoError> {
    match syntax {
        FrontmatterSyntax::Toml => parse_toml(text),
        FrontmatterSyntax::Yaml => parse_fallback_lines(text),
    }
}

fn parse_toml(text: &str) -> Result<IndexMap<String, Scalar>, JidoError> {
    let value: toml::Value =
        toml::from_str(text).map_err(|e| JidoError::parse_failed(format!("invalid TOML: {e}")))?;
    let table = value
        .as_table()
        .ok_or_else(|| JidoError::parse_failed("TOML frontmatter must be a table"))?;
    let mut map = IndexMap::new();
    for (k, v) in table {
        map.insert(k.clone(), toml_to_scalar(v));
    }
    Ok(map)
}

fn toml_to_scalar(value: &toml::Value) -> Scalar {
    match value {
        toml::Value::String(s) => Scalar::String(s.clone()),
        toml::Value::Integer(i) => Scalar::Int(*i),
        toml::Value::Float(f) => Scalar::Float(*f),
        toml::Value::Boolean(b) => Scalar::Bool(*b),
        toml::Value::Array(items) => Scalar::List(items.iter().map(toml_to_scalar).collect()),
        other => Scalar::String(other.to_string()),
    }
}

/// Deterministic fallback decoder used whenever no external YAML/TOML
/// library is configured: decodes `key: value` (or `key = value`) lines,
/// recognizing booleans, signed integers, signed floats, and
/// single/double-quoted strings. Everything else is kept as a raw string.
fn parse_fallback_lines(text: &str) -> Result<IndexMap<String, Scalar>, JidoError> {
    let mut map = IndexMap::new();
    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let sep = line
            .find(':')
            .or_else(|| line.find('='))
            .ok_or_else(|| {
                JidoError::parse_failed(format!("malformed frontmatter line {}", lineno + 1))
            })?;
        let key = line[..sep].trim().to_string();
        let raw_value = line[sep + 1..].trim();
        map.insert(key, parse_scalar(raw_value));
    }
    Ok(map)
}

fn parse_scalar(raw: &str) -> Scalar {
    if let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
    {
        return Scalar::String(inner.replace("\\\"", "\""));
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let items = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|s| parse_scalar(s.trim())).collect()
        };
        return Scalar::List(items);
    }
    match raw {
        "true" => return Scalar::Bool(true),
        "false" => return Scalar::Bool(false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Scalar::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Scalar::Float(f);
    }
    Scalar::String(raw.to_string())
}

/// Render a frontmatter map as `key: "value"` (YAML) or `key = "value"`
/// (TOML) lines, keys sorted by their string form.
pub fn serialize_frontmatter(map: &IndexMap<String, Scalar>, syntax: FrontmatterSyntax) -> String {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let assign = match syntax {
        FrontmatterSyntax::Yaml => ": ",
        FrontmatterSyntax::Toml => " = ",
    };
    keys.into_iter()
        .map(|k| format!("{k}{assign}{}", render_scalar(&map[k])))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_scalar(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::List(items) => {
            let rendered: Vec<String> = items.iter().map(render_scalar).collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

pub fn delimiter_for(syntax: FrontmatterSyntax) -> &'static str {
    syntax.delimiter()
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;
