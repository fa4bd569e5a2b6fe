//! Literal search-and-replace rules
//!
//! `\Replace{text}{replacement}` rules are kept as token groups until
//! output time, then flattened with the final macro table and applied to
//! every text run. `\Replace*` rules are read as raw characters and
//! applied once to the finished output.

use crate::core::engine::{MacroTable, NodeList, SourceLocation};
use crate::utils::error::XppResult;
use log::{debug, warn};

/// One resolved rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub replacement: String,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Rule {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Replace every non-overlapping occurrence, scanning left to right
    pub fn apply(&self, text: &str) -> String {
        if self.pattern.is_empty() {
            return text.to_string();
        }
        text.replace(&self.pattern, &self.replacement)
    }
}

/// Apply rules in order, each to the result of the previous one
pub fn apply_rules(rules: &[Rule], text: &str) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

#[derive(Debug, Clone)]
struct PendingRule {
    pattern: NodeList,
    replacement: NodeList,
    loc: SourceLocation,
}

/// Rules declared with `\Replace{...}{...}`
#[derive(Debug, Clone, Default)]
pub struct ReplacementRules {
    pending: Vec<PendingRule>,
}

impl ReplacementRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: NodeList, replacement: NodeList, loc: &SourceLocation) {
        debug!("replace rule at {}: '{}' -> '{}'", loc, pattern, replacement);
        self.pending.push(PendingRule {
            pattern,
            replacement,
            loc: loc.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Flatten every rule against `macros`. Rules with an empty pattern
    /// are dropped with a warning.
    pub fn resolve(&self, macros: &MacroTable, max_depth: usize) -> XppResult<Vec<Rule>> {
        let mut rules = Vec::with_capacity(self.pending.len());
        for rule in &self.pending {
            let pattern = macros.flatten(&rule.pattern, max_depth)?;
            if pattern.is_empty() {
                warn!("{}: ignoring \\Replace with an empty pattern", rule.loc);
                continue;
            }
            let replacement = macros.flatten(&rule.replacement, max_depth)?;
            rules.push(Rule::new(pattern, replacement));
        }
        Ok(rules)
    }
}

/// Rules declared with `\Replace*{...}{...}`
#[derive(Debug, Clone, Default)]
pub struct RawReplacementRules {
    rules: Vec<Rule>,
}

impl RawReplacementRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: String, replacement: String, loc: &SourceLocation) {
        if pattern.is_empty() {
            warn!("{}: ignoring \\Replace* with an empty pattern", loc);
            return;
        }
        debug!("raw replace rule at {}: '{}' -> '{}'", loc, pattern, replacement);
        self.rules.push(Rule::new(pattern, replacement));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply(&self, text: &str) -> String {
        apply_rules(&self.rules, text)
    }
}
