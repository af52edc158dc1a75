//! Regex-based content scanning ("safety scan", spec §6/§9(c)).
//!
//! A [`SafetyPolicy`] is an optional, caller-supplied set of rules checked
//! against a document's serialized content on `save` and `render`. Matches
//! are non-overlapping, left-to-right, longest-match-wins: at each scan
//! position every rule is tried and the longest match is kept, then the
//! cursor advances past it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A single compiled detection rule.
#[derive(Debug, Clone)]
pub struct SafetyRule {
    pub code: String,
    pub severity: Severity,
    pub regex: Regex,
}

impl SafetyRule {
    pub fn new(code: impl Into<String>, severity: Severity, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            code: code.into(),
            severity,
            regex: Regex::new(pattern)?,
        })
    }
}

/// A single scan hit (spec §3 `Finding`). Offsets are byte positions into
/// the scanned content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub code: String,
    pub severity: Severity,
    pub index: usize,
    pub length: usize,
    pub line: usize,
    pub column: usize,
    pub snippet: String,
}

/// Rules plus the policy governing which findings block the calling
/// command.
#[derive(Debug, Clone, Default)]
pub struct SafetyPolicy {
    pub rules: Vec<SafetyRule>,
    pub approved_codes: HashSet<String>,
    pub block_severities: HashSet<Severity>,
}

impl SafetyPolicy {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any of `findings` should block the command under this
    /// policy: severity is in `block_severities` and the code has not been
    /// explicitly approved.
    pub fn blocks(&self, findings: &[Finding]) -> bool {
        findings
            .iter()
            .any(|f| self.block_severities.contains(&f.severity) && !self.approved_codes.contains(&f.code))
    }
}

/// Scan `content` against `policy`, producing non-overlapping findings in
/// left-to-right, longest-match order.
pub fn scan(policy: &SafetyPolicy, content: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut cursor = 0usize;

    while cursor < content.len() {
        let mut best: Option<(usize, usize, &SafetyRule)> = None;
        for rule in &policy.rules {
            if let Some(m) = rule.regex.find_at(content, cursor) {
                if m.start() != cursor {
                    continue;
                }
                let len = m.end() - m.start();
                let better = match best {
                    None => true,
                    Some((_, best_len, _)) => len > best_len,
                };
                if better {
                    best = Some((m.start(), len, rule));
                }
            }
        }

        match best {
            Some((start, len, rule)) => {
                let (line, column) = line_column(content, start);
                findings.push(Finding {
                    code: rule.code.clone(),
                    severity: rule.severity,
                    index: start,
                    length: len,
                    line,
                    column,
                    snippet: content[start..start + len].to_string(),
                });
                cursor = start + len.max(1);
            }
            None => cursor += next_char_len(content, cursor),
        }
    }

    findings
}

fn next_char_len(content: &str, at: usize) -> usize {
    content[at..].chars().next().map(|c| c.len_utf8()).unwrap_or(1)
}

fn line_column(content: &str, index: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for ch in content[..index].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
#[path = "safety_tests.rs"]
mod tests;
