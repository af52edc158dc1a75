//! The document model: frontmatter + body with revision/dirty tracking
//! (spec §3, §4.1).

use crate::error::JidoError;
use crate::frontmatter::{self, FrontmatterSyntax};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A scalar or nested-list value a frontmatter key can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<Scalar>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterMode {
    Merge,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEndings {
    #[default]
    Preserve,
    Lf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingWhitespace {
    #[default]
    Preserve,
    Trim,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub line_endings: LineEndings,
    pub trailing_whitespace: TrailingWhitespace,
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub default_syntax: FrontmatterSyntax,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_syntax: FrontmatterSyntax::Yaml,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SerializeOptions {
    pub emit_empty_frontmatter: bool,
    pub normalize: NormalizeOptions,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            emit_empty_frontmatter: false,
            normalize: NormalizeOptions::default(),
        }
    }
}

/// A patch to apply to a document's body (spec §4.1).
pub enum BodyPatch {
    Full(String),
    SearchReplace {
        search: String,
        replace: String,
        global: bool,
    },
    Transform(Box<dyn Fn(&str) -> String + Send + Sync>),
}

/// Frontmatter + body, with revision/dirty tracking (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub path: Option<PathBuf>,
    pub frontmatter: IndexMap<String, Scalar>,
    pub body: String,
    pub raw: String,
    pub schema: Option<String>,
    pub dirty: bool,
    pub revision: u64,
    syntax: FrontmatterSyntax,
}

impl Document {
    /// Create an empty document, e.g. for a file that doesn't exist yet.
    pub fn blank(path: Option<PathBuf>, schema: Option<String>) -> Self {
        Self {
            path,
            frontmatter: IndexMap::new(),
            body: String::new(),
            raw: String::new(),
            schema,
            dirty: false,
            revision: 0,
            syntax: FrontmatterSyntax::Yaml,
        }
    }

    /// Parse `raw` bytes into a document.
    pub fn parse(raw: &str, opts: ParseOptions) -> Result<Self, JidoError> {
        let parsed = frontmatter::split_and_parse(raw, opts.default_syntax)?;
        Ok(Self {
            path: None,
            frontmatter: parsed.frontmatter,
            body: parsed.body,
            raw: raw.to_string(),
            schema: None,
            dirty: false,
            revision: 0,
            syntax: parsed.syntax.unwrap_or(opts.default_syntax),
        })
    }

    /// Serialize the document back to its on-disk text form.
    pub fn serialize(&self, opts: SerializeOptions) -> Result<String, JidoError> {
        let mut out = String::new();
        if !self.frontmatter.is_empty() || opts.emit_empty_frontmatter {
            let delim = frontmatter::delimiter_for(self.syntax);
            let body = frontmatter::serialize_frontmatter(&self.frontmatter, self.syntax);
            out.push_str(delim);
            out.push('\n');
            if !body.is_empty() {
                out.push_str(&body);
                out.push('\n');
            }
            out.push_str(delim);
            out.push('\n');
        }
        out.push_str(&normalize_body(&self.body, opts.normalize));
        Ok(out)
    }

    /// The canonical byte form used to decide whether an edit is effective
    /// (spec §4.1 revision/dirty contract). Independent of any caller-
    /// supplied serialize options.
    fn canonical_bytes(&self) -> Result<String, JidoError> {
        self.serialize(SerializeOptions {
            emit_empty_frontmatter: false,
            normalize: NormalizeOptions {
                line_endings: LineEndings::Lf,
                trailing_whitespace: TrailingWhitespace::Trim,
            },
        })
    }

    /// Apply an edit, bumping `revision`/`dirty` only if the canonical form
    /// actually changed.
    fn apply_effective_change<F>(&mut self, mutate: F) -> Result<(), JidoError>
    where
        F: FnOnce(&mut Self),
    {
        let before = self.canonical_bytes()?;
        mutate(self);
        let after = self.canonical_bytes()?;
        if before != after {
            self.revision += 1;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn update_frontmatter(
        &mut self,
        changes: IndexMap<String, Scalar>,
        mode: FrontmatterMode,
    ) -> Result<(), JidoError> {
        self.apply_effective_change(|doc| match mode {
            FrontmatterMode::Merge => {
                for (k, v) in changes {
                    doc.frontmatter.insert(k, v);
                }
            }
            FrontmatterMode::Replace => {
                doc.frontmatter = changes;
            }
        })
    }

    pub fn update_body(&mut self, body: String) -> Result<(), JidoError> {
        self.apply_effective_change(|doc| doc.body = body)
    }

    pub fn apply_body_patch(&mut self, patch: BodyPatch) -> Result<(), JidoError> {
        self.apply_effective_change(|doc| {
            doc.body = match patch {
                BodyPatch::Full(s) => s,
                BodyPatch::SearchReplace {
                    search,
                    replace,
                    global,
                } => {
                    if global {
                        doc.body.replace(&search, &replace)
                    } else {
                        doc.body.replacen(&search, &replace, 1)
                    }
                }
                BodyPatch::Transform(f) => f(&doc.body),
            };
        })
    }

    /// Clear `dirty` without touching `revision`.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

fn normalize_body(body: &str, opts: NormalizeOptions) -> String {
    let mut text = if opts.line_endings == LineEndings::Lf {
        body.replace("\r\n", "\n")
    } else {
        body.to_string()
    };
    if opts.trailing_whitespace == TrailingWhitespace::Trim {
        text = text
            .split('\n')
            .map(|line| line.trim_end_matches([' ', '\t']))
            .collect::<Vec<_>>()
            .join("\n");
    }
    text
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
