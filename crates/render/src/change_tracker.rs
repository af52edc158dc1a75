//! Incremental-vs-full render decision (spec §4.5).
//!
//! Purely advisory metadata attached to a render result: both modes must
//! produce identical preview bytes for the same input, so this never
//! changes what gets rendered, only what the result says about it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    Incremental,
    Full,
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeTrackerThresholds {
    pub ratio: f64,
    pub lines: usize,
}

impl Default for ChangeTrackerThresholds {
    fn default() -> Self {
        Self {
            ratio: 0.30,
            lines: 120,
        }
    }
}

/// Line-by-line diff of `previous` against `current`, returning the
/// changed-line count, total lines, and the incremental/full decision.
pub fn decide(
    previous: Option<&str>,
    current: &str,
    thresholds: ChangeTrackerThresholds,
) -> (ChangeDecision, usize, usize) {
    let current_lines: Vec<&str> = current.lines().collect();
    let total_lines = current_lines.len().max(1);

    let Some(previous) = previous else {
        return (ChangeDecision::Full, total_lines, total_lines);
    };

    let previous_lines: Vec<&str> = previous.lines().collect();
    let changed_lines = changed_line_count(&previous_lines, &current_lines);

    let ratio = changed_lines as f64 / total_lines as f64;
    let decision = if ratio > thresholds.ratio || changed_lines > thresholds.lines {
        ChangeDecision::Full
    } else {
        ChangeDecision::Incremental
    };
    (decision, changed_lines, total_lines)
}

fn changed_line_count(previous: &[&str], current: &[&str]) -> usize {
    let common = previous.len().min(current.len());
    let mut changed = previous.len().abs_diff(current.len());
    for i in 0..common {
        if previous[i] != current[i] {
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
#[path = "change_tracker_tests.rs"]
mod tests;
